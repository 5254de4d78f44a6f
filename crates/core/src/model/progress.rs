use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::MaterialId;

/// Atomic record that a material was viewed by the user.
///
/// Facts are non-retractable: there is no way to "unview" a material, which
/// is what makes set-union a sufficient and conflict-free merge rule when
/// reconciling local and remote copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewedFact {
    pub material_id: MaterialId,
    pub viewed_at: DateTime<Utc>,
    pub time_spent_sec: Option<u32>,
}

impl ViewedFact {
    #[must_use]
    pub fn new(material_id: MaterialId, viewed_at: DateTime<Utc>) -> Self {
        Self {
            material_id,
            viewed_at,
            time_spent_sec: None,
        }
    }

    #[must_use]
    pub fn with_time_spent(mut self, seconds: u32) -> Self {
        self.time_spent_sec = Some(seconds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn fact_carries_optional_time_spent() {
        let fact = ViewedFact::new(MaterialId::new(1), fixed_now());
        assert_eq!(fact.time_spent_sec, None);

        let timed = fact.clone().with_time_spent(90);
        assert_eq!(timed.time_spent_sec, Some(90));
        assert_eq!(timed.material_id, fact.material_id);
    }
}
