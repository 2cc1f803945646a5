use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical death cause. Unrecognised text is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cause {
    Poison,
    Acid,
    Lava,
    Curse,
    Frostbite,
    Polymorph,
    StellarCollapse,
    Toxin,
    SelfInflicted,
    Explosion,
    Electricity,
    Fire,
    Suffocation,
    GoldTransmutation,
    /// The session recorded no cause at all
    Unknown,
    Other(String),
}

impl Cause {
    pub fn label(&self) -> &str {
        match self {
            Cause::Poison => "poison",
            Cause::Acid => "acid",
            Cause::Lava => "lava",
            Cause::Curse => "curse",
            Cause::Frostbite => "frostbite",
            Cause::Polymorph => "polymorph",
            Cause::StellarCollapse => "stellar collapse",
            Cause::Toxin => "toxin",
            Cause::SelfInflicted => "self-inflicted",
            Cause::Explosion => "explosion",
            Cause::Electricity => "electricity",
            Cause::Fire => "fire",
            Cause::Suffocation => "suffocation",
            Cause::GoldTransmutation => "gold transmutation",
            Cause::Unknown => "<unknown>",
            Cause::Other(text) => text,
        }
    }

    /// Environmental hazards, as opposed to creatures or the player's own spells.
    pub fn is_hazard(&self) -> bool {
        matches!(
            self,
            Cause::Poison
                | Cause::Acid
                | Cause::Lava
                | Cause::Curse
                | Cause::Frostbite
                | Cause::Polymorph
                | Cause::StellarCollapse
                | Cause::Toxin
                | Cause::Fire
                | Cause::Suffocation
                | Cause::Electricity
                | Cause::Explosion
        )
    }

    /// Causes that never count as a nemesis.
    pub fn is_nemesis_candidate(&self) -> bool {
        !matches!(
            self,
            Cause::Unknown | Cause::GoldTransmutation | Cause::SelfInflicted
        )
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Cause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// Order matters: the first pattern that matches decides the cause.
static PATTERNS: Lazy<Vec<(Regex, Cause)>> = Lazy::new(|| {
    [
        (r"(?i)midas|迈达斯|点金|ミダス", Cause::GoldTransmutation),
        (r"(?i)acid|酸液|酸", Cause::Acid),
        (r"(?i)lava|岩浆|溶岩", Cause::Lava),
        (r"(?i)curse|诅咒|呪い", Cause::Curse),
        (r"(?i)cold|freez|冰冷|冻伤", Cause::Frostbite),
        (r"(?i)polymorph|变形", Cause::Polymorph),
        (r"(?i)\bsun|超新星|太阳|恒星", Cause::StellarCollapse),
        (r"(?i)poison|中毒", Cause::Poison),
        (r"(?i)toxic|毒", Cause::Toxin),
        (r"(?i)minä|我自己|米纳", Cause::SelfInflicted),
        (r"(?i)explosion|爆炸|爆発", Cause::Explosion),
        (r"(?i)electricity|雷电|电击", Cause::Electricity),
        (r"(?i)fire|火焰|燃烧", Cause::Fire),
        (r"(?i)suffocation|窒息", Cause::Suffocation),
    ]
    .into_iter()
    .map(|(pattern, cause)| (Regex::new(pattern).expect("valid regex"), cause))
    .collect()
});

/// Map free-form (possibly localised) death text onto a canonical cause.
pub fn normalize(raw: &str) -> Cause {
    let raw = raw.trim();
    if raw.is_empty() {
        return Cause::Unknown;
    }

    PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(raw))
        .map(|(_, cause)| cause.clone())
        .unwrap_or_else(|| Cause::Other(raw.to_string()))
}
