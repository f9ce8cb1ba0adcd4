use chrono::NaiveDate;

/// Prefix for system-generated resident codes (`SF-000123`).
pub const RESIDENT_CODE_PREFIX: &str = "SF";

/// Relationship label that promotes a dependent into the spouse slot.
pub const SPOUSE_RELATIONSHIP: &str = "SPOUSE";

/// Closed set of relationship keywords, uppercased. Used both to validate
/// dependent relationship cells and to detect column-shifted rows where a
/// relationship landed in the last-name cell.
pub const RELATIONSHIP_KEYWORDS: &[&str] = &[
    "WIFE",
    "HUSBAND",
    "SON",
    "DAUGHTER",
    "BROTHER",
    "SISTER",
    "MOTHER",
    "FATHER",
    "GRANDMOTHER",
    "GRANDFATHER",
    "GRANDSON",
    "GRANDDAUGHTER",
    "LIVE-IN PARTNER",
    "GUARDIAN",
    "SPOUSE",
];

/// Fixed sector vocabulary. Canonical storage is one `resident_sectors` row
/// per value; `sector_summary` is a projection derived from these labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    IndigenousPeople,
    SeniorCitizen,
    Pwd,
    BarangayOfficial,
    Ofw,
    SoloParent,
    Farmers,
    Fisherfolk,
    BancaOwner,
    LguEmployee,
    Toda,
    Student,
    Lifeguard,
    Others,
}

impl Sector {
    pub const ALL: &'static [Sector] = &[
        Sector::IndigenousPeople,
        Sector::SeniorCitizen,
        Sector::Pwd,
        Sector::BarangayOfficial,
        Sector::Ofw,
        Sector::SoloParent,
        Sector::Farmers,
        Sector::Fisherfolk,
        Sector::BancaOwner,
        Sector::LguEmployee,
        Sector::Toda,
        Sector::Student,
        Sector::Lifeguard,
        Sector::Others,
    ];

    /// Display label, verbatim from the seeded vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            Sector::IndigenousPeople => "Indigenous People",
            Sector::SeniorCitizen => "Senior Citizen",
            Sector::Pwd => "PWD",
            Sector::BarangayOfficial => "BRGY. Official/Employee",
            Sector::Ofw => "OFW",
            Sector::SoloParent => "Solo Parent",
            Sector::Farmers => "Farmers",
            Sector::Fisherfolk => "Fisherfolk",
            Sector::BancaOwner => "Fisherman/Banca Owner",
            Sector::LguEmployee => "LGU Employee",
            Sector::Toda => "TODA",
            Sector::Student => "Student",
            Sector::Lifeguard => "Lifeguard",
            Sector::Others => "Others",
        }
    }

    /// Stable value stored in `resident_sectors.sector`.
    pub fn as_str(self) -> &'static str {
        self.label()
    }

    pub fn from_stored(value: &str) -> Option<Sector> {
        Sector::ALL.iter().copied().find(|s| s.label() == value)
    }

    /// Match a normalized (uppercased) header token against this vocabulary.
    /// Source forms abbreviate inconsistently, so a few variants are folded.
    pub fn from_header(token: &str) -> Option<Sector> {
        let sector = match token {
            "INDIGENOUS PEOPLE" | "INDIGENOUS PEOPLES" | "IP" => Sector::IndigenousPeople,
            "SENIOR CITIZEN" | "SENIOR CITIZENS" | "SENIOR" => Sector::SeniorCitizen,
            "PWD" => Sector::Pwd,
            "BRGY. OFFICIAL/EMPLOYEE" | "BRGY OFFICIAL/EMPLOYEE" | "BRGY OFFICIAL"
            | "BARANGAY OFFICIAL" => Sector::BarangayOfficial,
            "OFW" => Sector::Ofw,
            "SOLO PARENT" => Sector::SoloParent,
            "FARMERS" | "FARMER" => Sector::Farmers,
            "FISHERFOLK" => Sector::Fisherfolk,
            "FISHERMAN/BANCA OWNER" | "BANCA OWNER" => Sector::BancaOwner,
            "LGU EMPLOYEE" => Sector::LguEmployee,
            "TODA" => Sector::Toda,
            "STUDENT" => Sector::Student,
            "LIFEGUARD" => Sector::Lifeguard,
            "OTHERS" | "OTHER" => Sector::Others,
            _ => return None,
        };
        Some(sector)
    }
}

/// Comma-joined projection written to `resident_profiles.sector_summary`.
/// "None" (not empty) when no sector is flagged; dashboards key off that.
pub fn sector_summary(sectors: &[Sector]) -> String {
    if sectors.is_empty() {
        "None".to_string()
    } else {
        sectors
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// De-duplication key for a household: trimmed, uppercased name fields plus
/// barangay. Two households with the same key are the same household.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub barangay: String,
}

impl IdentityKey {
    pub fn new(last: &str, first: &str, middle: &str, barangay: &str) -> Self {
        IdentityKey {
            last_name: last.trim().to_uppercase(),
            first_name: first.trim().to_uppercase(),
            middle_name: middle.trim().to_uppercase(),
            barangay: barangay.trim().to_uppercase(),
        }
    }
}

/// Spouse name block. Lifecycle-bound to the household row; never persisted
/// on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpouseName {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub ext_name: Option<String>,
}

impl SpouseName {
    pub fn is_empty(&self) -> bool {
        self.last_name.is_empty() && self.first_name.is_empty() && self.middle_name.is_empty()
    }
}

/// One dependent, cascade-owned by its household.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberDraft {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub ext_name: Option<String>,
    pub relationship: String,
    pub birthdate: Option<NaiveDate>,
    pub occupation: Option<String>,
}

/// A fully reconciled household candidate, ready for duplicate resolution
/// and commit. Name fields are already trimmed and uppercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseholdDraft {
    /// 1-based visual row in the source file; kept for log events.
    pub source_row: usize,

    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub ext_name: Option<String>,

    pub house_no: Option<String>,
    pub purok: Option<String>,
    pub barangay: String,

    pub sex: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub civil_status: Option<String>,
    pub religion: Option<String>,
    pub occupation: Option<String>,
    pub contact_no: Option<String>,
    pub precinct_no: Option<String>,

    pub spouse: Option<SpouseName>,
    pub members: Vec<MemberDraft>,

    pub sectors: Vec<Sector>,
    pub other_sector_details: Option<String>,
}

impl HouseholdDraft {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(
            &self.last_name,
            &self.first_name,
            &self.middle_name,
            &self.barangay,
        )
    }
}

pub fn resident_code(id: i64) -> String {
    format!("{RESIDENT_CODE_PREFIX}-{id:06}")
}
