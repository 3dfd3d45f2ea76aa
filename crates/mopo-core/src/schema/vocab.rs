//! Vocabularies and patterns used by the validator.
//!
//! The v0 schema embeds its script list, so it is kept here as a closed
//! set. The v1 vocabularies (licenses, ISO 639-3, ISO 15924) are
//! maintained externally and are only checked by shape. Nothing here is
//! ever fetched.

use regex::Regex;
use std::sync::LazyLock;

/// ISO 15924 four-letter script code shape.
pub static SCRIPT_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][a-z]{3}$").unwrap());

/// ISO 639-3 three-letter language code shape.
pub static LANGUAGE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]{3}$").unwrap());

/// Bare ORCID iD, e.g. `0000-0002-1825-0097`.
pub static ORCID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[0-9X]$").unwrap());

/// ISO 15924 codes accepted by the v0 schema.
pub const V0_SCRIPTS: &[&str] = &[
    "Adlm", "Afak", "Aghb", "Ahom", "Arab", "Aran", "Armi", "Armn", "Avst", "Bali", "Bamu",
    "Bass", "Batk", "Beng", "Bhks", "Blis", "Bopo", "Brah", "Brai", "Bugi", "Buhd", "Cakm",
    "Cans", "Cari", "Cham", "Cher", "Chrs", "Cirt", "Copt", "Cpmn", "Cprt", "Cyrl", "Cyrs",
    "Deva", "Diak", "Dogr", "Dsrt", "Dupl", "Egyd", "Egyh", "Egyp", "Elba", "Elym", "Ethi",
    "Geok", "Geor", "Glag", "Gong", "Gonm", "Goth", "Gran", "Grek", "Gujr", "Guru", "Hanb",
    "Hang", "Hani", "Hano", "Hans", "Hant", "Hatr", "Hebr", "Hira", "Hluw", "Hmng", "Hmnp",
    "Hrkt", "Hung", "Inds", "Ital", "Jamo", "Java", "Jpan", "Jurc", "Kali", "Kana", "Kawi",
    "Khar", "Khmr", "Khoj", "Kitl", "Kits", "Knda", "Kore", "Kpel", "Kthi", "Lana", "Laoo",
    "Latf", "Latg", "Latn", "Leke", "Lepc", "Limb", "Lina", "Linb", "Lisu", "Loma", "Lyci",
    "Lydi", "Mahj", "Maka", "Mand", "Mani", "Marc", "Maya", "Medf", "Mend", "Merc", "Mero",
    "Mlym", "Modi", "Mong", "Moon", "Mroo", "Mtei", "Mult", "Mymr", "Nagm", "Nand", "Narb",
    "Nbat", "Newa", "Nkdb", "Nkgb", "Nkoo", "Nshu", "Ogam", "Olck", "Orkh", "Orya", "Osge",
    "Osma", "Ougr", "Palm", "Pauc", "Pcun", "Pelm", "Perm", "Phag", "Phli", "Phlp", "Phlv",
    "Phnx", "Piqd", "Plrd", "Prti", "Psin", "Qaaa", "Qabx", "Ranj", "Rjng", "Rohg", "Roro",
    "Runr", "Samr", "Sara", "Sarb", "Saur", "Sgnw", "Shaw", "Shrd", "Shui", "Sidd", "Sind",
    "Sinh", "Sogd", "Sogo", "Sora", "Soyo", "Sund", "Sylo", "Syrc", "Syre", "Syrj", "Syrn",
    "Tagb", "Takr", "Tale", "Talu", "Taml", "Tang", "Tavt", "Telu", "Teng", "Tfng", "Tglg",
    "Thaa", "Thai", "Tibt", "Tirh", "Tnsa", "Toto", "Ugar", "Vaii", "Visp", "Vith", "Wara",
    "Wcho", "Wole", "Xpeo", "Xsux", "Yezi", "Yiii", "Zanb", "Zinh", "Zmth", "Zsye", "Zsym",
    "Zxxx", "Zyyy", "Zzzz",
];

/// Model type implied by every v0 record.
pub const V0_MODEL_TYPE: &str = "recognition";

pub fn is_v0_script(code: &str) -> bool {
    V0_SCRIPTS.binary_search(&code).is_ok()
}

/// `other-*` licenses are outside the controlled vocabulary and need a
/// human-readable name and link next to them.
pub fn is_other_license(license: &str) -> bool {
    license.starts_with("other")
}

pub fn is_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}
