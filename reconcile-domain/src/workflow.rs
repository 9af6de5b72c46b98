use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::WorkflowStatus;

/// One bank file's ingestion job id paired with its terminal success flag.
/// `success == None` means the job has not yet reported completion — see
/// SPEC_FULL.md §9 Decision 3 for why every bank file is tracked
/// individually instead of retaining only the most recent job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankJobSlot {
    pub job_id: Uuid,
    pub success: Option<bool>,
}

impl BankJobSlot {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            success: None,
        }
    }
}

/// A single reconciliation request's lifecycle object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub system_job_id: Option<Uuid>,
    pub system_job_success: Option<bool>,
    pub bank_jobs: Vec<BankJobSlot>,
    pub reconciliation_job_id: Option<Uuid>,
    pub status: WorkflowStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            system_job_id: None,
            system_job_success: None,
            bank_jobs: Vec::new(),
            reconciliation_job_id: None,
            status: WorkflowStatus::InProgress,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bank_slot_mut(&mut self, job_id: Uuid) -> Option<&mut BankJobSlot> {
        self.bank_jobs.iter_mut().find(|slot| slot.job_id == job_id)
    }

    pub fn all_bank_jobs_reported(&self) -> bool {
        self.bank_jobs.iter().all(|slot| slot.success.is_some())
    }

    pub fn all_bank_jobs_succeeded(&self) -> bool {
        !self.bank_jobs.is_empty() && self.bank_jobs.iter().all(|slot| slot.success == Some(true))
    }

    /// True once every child ingestion slot (system + every bank file) has
    /// reported a terminal outcome, regardless of whether it succeeded.
    pub fn ready_to_gate(&self) -> bool {
        self.system_job_success.is_some() && self.all_bank_jobs_reported()
    }

    /// True once `ready_to_gate` holds AND every slot succeeded: the
    /// precondition for running reconciliation.
    pub fn ingestion_succeeded(&self) -> bool {
        self.system_job_success == Some(true) && self.all_bank_jobs_succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn gate_waits_for_every_bank_slot() {
        let mut wf = Workflow::new(date(2021, 1, 1), date(2021, 1, 31));
        wf.system_job_success = Some(true);
        let slot_a = Uuid::new_v4();
        let slot_b = Uuid::new_v4();
        wf.bank_jobs.push(BankJobSlot::new(slot_a));
        wf.bank_jobs.push(BankJobSlot::new(slot_b));
        assert!(!wf.ready_to_gate());

        wf.bank_slot_mut(slot_a).expect("slot a").success = Some(true);
        assert!(!wf.ready_to_gate());

        wf.bank_slot_mut(slot_b).expect("slot b").success = Some(false);
        assert!(wf.ready_to_gate());
        assert!(!wf.ingestion_succeeded());
    }

    #[test]
    fn single_bank_failure_fails_whole_workflow() {
        let mut wf = Workflow::new(date(2021, 1, 1), date(2021, 1, 31));
        wf.system_job_success = Some(true);
        let ok = Uuid::new_v4();
        let bad = Uuid::new_v4();
        wf.bank_jobs.push(BankJobSlot::new(ok));
        wf.bank_jobs.push(BankJobSlot::new(bad));
        wf.bank_slot_mut(ok).expect("ok slot").success = Some(true);
        wf.bank_slot_mut(bad).expect("bad slot").success = Some(false);

        assert!(wf.ready_to_gate());
        assert_eq!(wf.ingestion_succeeded(), false);
    }
}
