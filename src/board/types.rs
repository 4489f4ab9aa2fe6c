use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one request, assigned in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub usize);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "person-{}", self.0)
    }
}

/// One transport request: a named contact travelling with a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub location: String,
    pub group_size: u32,
    pub priority: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketId {
    #[serde(rename = "church-bus-load-1")]
    ChurchBus1,
    #[serde(rename = "church-bus-load-2")]
    ChurchBus2,
    #[serde(rename = "church-bus-load-3")]
    ChurchBus3,
    #[serde(rename = "special-taxi-load-1")]
    SpecialTaxi1,
    #[serde(rename = "special-taxi-load-2")]
    SpecialTaxi2,
    #[serde(rename = "special-taxi-load-3")]
    SpecialTaxi3,
    #[serde(rename = "unassigned")]
    Unassigned,
}

impl BucketId {
    /// Display order on the board: the pool first, then every load.
    pub const ALL: [BucketId; 7] = [
        BucketId::Unassigned,
        BucketId::ChurchBus1,
        BucketId::ChurchBus2,
        BucketId::ChurchBus3,
        BucketId::SpecialTaxi1,
        BucketId::SpecialTaxi2,
        BucketId::SpecialTaxi3,
    ];

    pub const LOADS: [BucketId; 6] = [
        BucketId::ChurchBus1,
        BucketId::ChurchBus2,
        BucketId::ChurchBus3,
        BucketId::SpecialTaxi1,
        BucketId::SpecialTaxi2,
        BucketId::SpecialTaxi3,
    ];

    /// Taxi loads in the order the auto-assigner tries them
    pub const TAXI_LOADS: [BucketId; 3] = [
        BucketId::SpecialTaxi1,
        BucketId::SpecialTaxi2,
        BucketId::SpecialTaxi3,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BucketId::ChurchBus1 => "Church Bus Load 1",
            BucketId::ChurchBus2 => "Church Bus Load 2",
            BucketId::ChurchBus3 => "Church Bus Load 3",
            BucketId::SpecialTaxi1 => "Special Taxi Load 1",
            BucketId::SpecialTaxi2 => "Special Taxi Load 2",
            BucketId::SpecialTaxi3 => "Special Taxi Load 3",
            BucketId::Unassigned => "Unassigned",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            BucketId::Unassigned => "Private Lifts & Uber",
            other => other.label(),
        }
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregates shown in a bucket header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub requests: usize,
    pub total_people: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub id: BucketId,
    pub items: Vec<Person>,
}

impl Bucket {
    pub fn new(id: BucketId) -> Self {
        Self { id, items: Vec::new() }
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            requests: self.items.len(),
            total_people: self.items.iter().map(|p| u64::from(p.group_size)).sum(),
        }
    }

    pub fn position(&self, id: PersonId) -> Option<usize> {
        self.items.iter().position(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
