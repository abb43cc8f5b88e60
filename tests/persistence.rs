//! Persistence and assertion invariants across the public API: text
//! round-trips through files, per-bin order survival, and idempotent
//! pattern assertion.

use std::io::Cursor;

use semnet::graphlet::Graphlet;
use semnet::pool::{Bindings, NodePool, PoolConfig};

fn scene() -> NodePool {
    let mut pool = NodePool::new();
    let table = pool.make_node("obj", None, false, -1.0, false);
    let kind = pool.add_prop(table, "ako", "table", false, 1.0, true).unwrap();
    pool.actualize(kind).unwrap();
    let color = pool.add_prop(table, "hq", "brown", false, 0.9, true).unwrap();
    pool.actualize(color).unwrap();
    let cup = pool.make_node("obj", None, false, -1.0, false);
    let on = pool.add_prop(cup, "loc", "on", false, 1.0, true).unwrap();
    pool.actualize(on).unwrap();
    pool.add_arg(on, "ref", table).unwrap();
    pool
}

fn dump(pool: &NodePool) -> String {
    let mut buf = Vec::new();
    pool.save_to(&mut buf, 0.0, true).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn file_round_trip_is_stable() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("scene.sn");
    let pool = scene();
    let written = pool.save(&path, 0.0, true).unwrap();
    assert_eq!(written, pool.node_cnt(true));

    let mut reloaded = NodePool::new();
    let read = reloaded.load(&path, false, true).unwrap();
    assert_eq!(read, written);
    assert_eq!(dump(&reloaded), dump(&pool));

    // A second generation changes nothing.
    let mut again = NodePool::new();
    again
        .load_from(Cursor::new(dump(&reloaded)), false, true)
        .unwrap();
    assert_eq!(dump(&again), dump(&pool));
}

#[test]
fn bin_order_survives_reload_into_reverse_pool() {
    let mut pool = NodePool::new();
    pool.make_bins().unwrap();
    let a = pool.make_node("ako", Some("table"), false, -1.0, false);
    let _b = pool.make_node("ako", Some("tap"), false, -1.0, false);
    pool.refresh(a);

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bins.sn");
    pool.save_bin(&path, -1, 0).unwrap();

    let mut rev = NodePool::with_config(PoolConfig {
        rev: true,
        ..PoolConfig::default()
    });
    rev.make_bins().unwrap();
    rev.load(&path, true, true).unwrap();

    let mut buf1 = Vec::new();
    pool.save_bin_to(&mut buf1, -1, 0).unwrap();
    let mut buf2 = Vec::new();
    rev.save_bin_to(&mut buf2, -1, 0).unwrap();
    assert_eq!(buf1, buf2);
}

#[test]
fn graphlet_block_loads_until_bracket() {
    let text = "\
obj+1 -blf-  1.000

hq+2  -lex-  red
      -hq->  obj+1
      -blf-  1.000 ]
obj+9 -blf-  1.000
";
    let mut halo = NodePool::halo_band();
    let mut g = Graphlet::new();
    let mut r = Cursor::new(text);
    halo.load_graph(&mut g, &mut r, true).unwrap();
    assert_eq!(g.num_items(), 2);
    assert!(halo.find_node("obj+9", false, false).is_none());
}

#[test]
fn assertion_is_idempotent() {
    let mut halo = NodePool::halo_band();
    let obj = halo.make_node("obj", None, false, 1.0, false);
    let red = halo.add_prop(obj, "hq", "red", false, 1.0, true).unwrap();
    let pat: Graphlet = [obj, red].into_iter().collect();

    let mut wm = NodePool::new();
    let mut b = Bindings::new();
    wm.assert_graph(&pat, &halo, &mut b, 0.0, 1).unwrap();
    let first = wm.changes();
    assert_eq!(first.adds, 2);
    assert_eq!(first.args, 1);

    wm.assert_graph(&pat, &halo, &mut b, 0.0, 2).unwrap();
    let second = wm.changes();
    assert_eq!(second.adds, 0);
    assert_eq!(second.args, 0);
    assert!(second.mods > 0); // stamps still move
    assert_eq!(wm.node_cnt(true), 2);
}

#[test]
fn labels_never_decrease() {
    let mut pool = NodePool::new();
    let a = pool.make_node("obj", None, false, 1.0, false);
    pool.make_node("obj", None, false, 1.0, false);
    let before = pool.label();
    pool.rem_node(a).unwrap();
    assert_eq!(pool.label(), before);
    let c = pool.make_node("obj", None, false, 1.0, false);
    assert!(c.inst() > before - 1);
    assert!(pool.label() > before);
}
