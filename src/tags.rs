//! Grammatical feature tags for lexical nodes.
//!
//! A [`TagSet`] is a 32-bit field holding a subset of the fixed grammatical
//! feature vocabulary. The bit order is load-bearing: the text codec writes
//! tags positionally by short name, so the enum order must never change.
//! Upper bits beyond the named features are reserved.

use serde::{Deserialize, Serialize};

/// One grammatical feature bit.
///
/// Short names match the `-tag-` vocabulary of the pool text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tag {
    /// Definite reference ("the").
    Def = 0,
    /// Alternative / indefinite choice.
    Alt = 1,
    /// Proper name.
    Name = 2,
    /// Possessive proper name ("Bob's").
    NameP = 3,
    /// Zero-inflection noun.
    NZero = 4,
    /// Singular noun.
    NSing = 5,
    /// Plural noun.
    NPl = 6,
    /// Mass noun.
    NMass = 7,
    /// Possessive noun.
    NPoss = 8,
    /// Base (positive) adjective.
    AProp = 9,
    /// Comparative adjective ("redder").
    AComp = 10,
    /// Superlative adjective ("reddest").
    ASup = 11,
    /// Imperative verb.
    VImp = 12,
    /// Present-tense verb.
    VPres = 13,
    /// Past-tense verb.
    VPast = 14,
    /// Progressive verb ("-ing").
    VProg = 15,
    /// Future verb.
    VFut = 16,
    /// Infinitive verb.
    VInf = 17,
    /// Adverb.
    Adv = 18,
    /// Feminine pronoun agreement.
    Fem = 19,
    /// Masculine pronoun agreement.
    Masc = 20,
    /// Neuter singular ("it").
    Item = 21,
    /// Plural pronoun ("them").
    Them = 22,
    /// Proximal deictic ("here").
    Here = 23,
    /// Distal deictic ("there").
    There = 24,
}

/// All tags in serialization order.
pub const ALL_TAGS: [Tag; 25] = [
    Tag::Def,
    Tag::Alt,
    Tag::Name,
    Tag::NameP,
    Tag::NZero,
    Tag::NSing,
    Tag::NPl,
    Tag::NMass,
    Tag::NPoss,
    Tag::AProp,
    Tag::AComp,
    Tag::ASup,
    Tag::VImp,
    Tag::VPres,
    Tag::VPast,
    Tag::VProg,
    Tag::VFut,
    Tag::VInf,
    Tag::Adv,
    Tag::Fem,
    Tag::Masc,
    Tag::Item,
    Tag::Them,
    Tag::Here,
    Tag::There,
];

impl Tag {
    /// Mask with only this tag's bit set.
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Canonical short name used by the text codec.
    pub const fn short_name(self) -> &'static str {
        match self {
            Tag::Def => "def",
            Tag::Alt => "alt",
            Tag::Name => "name",
            Tag::NameP => "namep",
            Tag::NZero => "nzero",
            Tag::NSing => "nsing",
            Tag::NPl => "npl",
            Tag::NMass => "nmass",
            Tag::NPoss => "nposs",
            Tag::AProp => "aprop",
            Tag::AComp => "acomp",
            Tag::ASup => "asup",
            Tag::VImp => "vimp",
            Tag::VPres => "vpres",
            Tag::VPast => "vpast",
            Tag::VProg => "vprog",
            Tag::VFut => "vfut",
            Tag::VInf => "vinf",
            Tag::Adv => "adv",
            Tag::Fem => "fem",
            Tag::Masc => "masc",
            Tag::Item => "item",
            Tag::Them => "them",
            Tag::Here => "here",
            Tag::There => "there",
        }
    }

    /// Look up a tag by its short name.
    pub fn from_short_name(name: &str) -> Option<Tag> {
        ALL_TAGS.iter().copied().find(|t| t.short_name() == name)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A set of grammatical feature bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TagSet(pub u32);

impl TagSet {
    /// Empty tag set.
    pub const EMPTY: TagSet = TagSet(0);

    /// All proper-noun bits.
    pub const PROPER: TagSet = TagSet(Tag::Name.bit() | Tag::NameP.bit());

    /// All common-noun bits.
    pub const NOUN: TagSet = TagSet(
        Tag::NZero.bit() | Tag::NSing.bit() | Tag::NPl.bit() | Tag::NMass.bit() | Tag::NPoss.bit(),
    );

    /// All adjective bits.
    pub const ADJ: TagSet = TagSet(Tag::AProp.bit() | Tag::AComp.bit() | Tag::ASup.bit());

    /// All verb bits.
    pub const VERB: TagSet = TagSet(
        Tag::VImp.bit()
            | Tag::VPres.bit()
            | Tag::VPast.bit()
            | Tag::VProg.bit()
            | Tag::VFut.bit()
            | Tag::VInf.bit(),
    );

    /// All pronoun agreement/deixis bits.
    pub const PRON: TagSet = TagSet(
        Tag::Fem.bit()
            | Tag::Masc.bit()
            | Tag::Item.bit()
            | Tag::Them.bit()
            | Tag::Here.bit()
            | Tag::There.bit(),
    );

    /// Set from a single tag.
    pub const fn single(tag: Tag) -> TagSet {
        TagSet(tag.bit())
    }

    /// Whether no bits are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether a specific tag is present.
    pub const fn has(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }

    /// Whether any bit of `other` is present.
    pub const fn intersects(self, other: TagSet) -> bool {
        self.0 & other.0 != 0
    }

    /// Add a tag.
    pub fn insert(&mut self, tag: Tag) {
        self.0 |= tag.bit();
    }

    /// Remove a tag.
    pub fn remove(&mut self, tag: Tag) {
        self.0 &= !tag.bit();
    }

    /// Union of two sets.
    pub const fn union(self, other: TagSet) -> TagSet {
        TagSet(self.0 | other.0)
    }

    /// Iterate the tags present, in serialization order.
    pub fn iter(self) -> impl Iterator<Item = Tag> {
        ALL_TAGS.into_iter().filter(move |t| self.has(*t))
    }

    /// Space-separated short names in fixed order (the `-tag-` payload).
    pub fn names(self) -> String {
        let parts: Vec<&str> = self.iter().map(Tag::short_name).collect();
        parts.join(" ")
    }

    /// Parse a space-separated list of short names. Unknown names are skipped.
    pub fn parse_names(text: &str) -> TagSet {
        let mut set = TagSet::EMPTY;
        for word in text.split_whitespace() {
            if let Some(tag) = Tag::from_short_name(word) {
                set.insert(tag);
            }
        }
        set
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = TagSet::EMPTY;
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_distinct_and_ordered() {
        for (i, tag) in ALL_TAGS.iter().enumerate() {
            assert_eq!(tag.bit(), 1 << i);
        }
    }

    #[test]
    fn short_names_round_trip() {
        for tag in ALL_TAGS {
            assert_eq!(Tag::from_short_name(tag.short_name()), Some(tag));
        }
        assert_eq!(Tag::from_short_name("bogus"), None);
    }

    #[test]
    fn masks_cover_expected_groups() {
        assert!(TagSet::NOUN.has(Tag::NSing));
        assert!(TagSet::NOUN.has(Tag::NPoss));
        assert!(!TagSet::NOUN.has(Tag::Name));
        assert!(TagSet::PROPER.has(Tag::Name));
        assert!(TagSet::VERB.has(Tag::VProg));
        assert!(TagSet::ADJ.has(Tag::ASup));
        assert!(TagSet::PRON.has(Tag::Them));
        // No overlap between the part-of-speech groups.
        assert!(!TagSet::NOUN.intersects(TagSet::VERB));
        assert!(!TagSet::ADJ.intersects(TagSet::PRON));
    }

    #[test]
    fn insert_remove_has() {
        let mut set = TagSet::EMPTY;
        set.insert(Tag::VPast);
        assert!(set.has(Tag::VPast));
        assert!(!set.has(Tag::VProg));
        set.remove(Tag::VPast);
        assert!(set.is_empty());
    }

    #[test]
    fn names_in_fixed_order() {
        let set: TagSet = [Tag::Fem, Tag::NSing, Tag::Def].into_iter().collect();
        // Emission order follows bit order, not insertion order.
        assert_eq!(set.names(), "def nsing fem");
    }

    #[test]
    fn parse_names_skips_unknown() {
        let set = TagSet::parse_names("nsing vprog wibble def");
        assert!(set.has(Tag::NSing));
        assert!(set.has(Tag::VProg));
        assert!(set.has(Tag::Def));
        assert_eq!(set.iter().count(), 3);
    }

    #[test]
    fn names_round_trip() {
        let set: TagSet = [Tag::Name, Tag::Masc, Tag::VInf].into_iter().collect();
        assert_eq!(TagSet::parse_names(&set.names()), set);
    }
}
