use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Amounts closer than this are treated as equal (one cent).
pub const CENT_EPSILON: f64 = 0.01;

// ---------------------------------------------------------------------------
// Partners
// ---------------------------------------------------------------------------

/// One of the two people sharing the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Partner {
    A,
    B,
}

impl Partner {
    pub fn other(self) -> Partner {
        match self {
            Partner::A => Partner::B,
            Partner::B => Partner::A,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl PartnerInfo {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Display name, falling back to the id when no name was configured.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Maps the stored partner ids onto the closed [`Partner`] enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partners {
    pub a: PartnerInfo,
    pub b: PartnerInfo,
}

impl Default for Partners {
    fn default() -> Self {
        Self {
            a: PartnerInfo::new("a", "Partner A"),
            b: PartnerInfo::new("b", "Partner B"),
        }
    }
}

impl Partners {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: PartnerInfo::new(a, ""),
            b: PartnerInfo::new(b, ""),
        }
    }

    pub fn resolve(&self, id: &str) -> Option<Partner> {
        let id = id.trim();
        if id.eq_ignore_ascii_case(&self.a.id) {
            Some(Partner::A)
        } else if id.eq_ignore_ascii_case(&self.b.id) {
            Some(Partner::B)
        } else {
            None
        }
    }

    pub fn info(&self, partner: Partner) -> &PartnerInfo {
        match partner {
            Partner::A => &self.a,
            Partner::B => &self.b,
        }
    }

    pub fn id(&self, partner: Partner) -> &str {
        &self.info(partner).id
    }

    pub fn label(&self, partner: Partner) -> &str {
        self.info(partner).label()
    }
}

/// A pair of amounts, one per partner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerPartner {
    pub a: f64,
    pub b: f64,
}

impl PerPartner {
    pub fn get(&self, partner: Partner) -> f64 {
        match partner {
            Partner::A => self.a,
            Partner::B => self.b,
        }
    }

    pub fn add(&mut self, partner: Partner, amount: f64) {
        match partner {
            Partner::A => self.a += amount,
            Partner::B => self.b += amount,
        }
    }

    pub fn sum(&self) -> f64 {
        self.a + self.b
    }
}

// ---------------------------------------------------------------------------
// Raw records, as fetched from the store or an import file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RawExpense {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    pub paid_by_id: String,
    pub date: String,
    pub created_at: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSettlement {
    pub id: i64,
    pub amount: f64,
    pub paid_by_id: String,
    pub paid_to_id: String,
    pub description: Option<String>,
    pub date: String,
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated records. Aggregation only ever sees these.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    /// `None` when the stored payer id matches neither partner.
    pub paid_by: Option<Partner>,
    pub paid_by_id: String,
    pub date: NaiveDate,
    pub created_at: Option<NaiveDateTime>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub id: i64,
    pub amount: f64,
    pub paid_by: Partner,
    pub paid_to: Partner,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: Option<NaiveDateTime>,
}

/// Fields for inserting or fully replacing an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: f64,
    pub category: String,
    pub paid_by_id: String,
    pub date: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub amount: f64,
    pub paid_by_id: String,
    pub paid_to_id: String,
    pub date: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
}
