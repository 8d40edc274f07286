use std::collections::BTreeMap;
use std::sync::Mutex;

use internlink::board::{Job, JobFilter, JobId, JobRepository};
use internlink::marketplace::pagination::{Page, PageRequest};
use internlink::marketplace::repository::RepositoryError;

/// In-memory job store backing the board binary. Search returns listings
/// newest first, ties broken by id so paging stays stable.
#[derive(Default)]
pub(crate) struct MemoryJobs {
    records: Mutex<BTreeMap<String, Job>>,
}

impl JobRepository for MemoryJobs {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut records = self.records.lock().expect("job store poisoned");
        if records.contains_key(&job.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(job.id.0.clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let records = self.records.lock().expect("job store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn delete(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("job store poisoned");
        records.remove(&id.0);
        Ok(())
    }

    fn search(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>, RepositoryError> {
        let records = self.records.lock().expect("job store poisoned");
        let mut jobs: Vec<Job> = records
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.posted_on.cmp(&a.posted_on).then(b.id.0.cmp(&a.id.0)));
        Ok(page.paginate(jobs))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn job(id: &str, title: &str, posted_on: NaiveDate) -> Job {
        Job {
            id: JobId(id.to_string()),
            title: title.to_string(),
            company: "Fjordworks".to_string(),
            location: "Trondheim".to_string(),
            description: "Ship features for the harbour logistics platform.".to_string(),
            contact_email: "jobs@fjordworks.no".to_string(),
            salary_floor: Some(52_000),
            salary_ceiling: Some(61_000),
            posted_on,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn inserting_the_same_id_twice_conflicts() {
        let store = MemoryJobs::default();
        let listing = job("job-000001", "Backend Developer", date(2026, 3, 1));

        store.insert(listing.clone()).expect("first insert");
        let error = store.insert(listing).expect_err("second insert");
        assert!(matches!(error, RepositoryError::Conflict));
    }

    #[test]
    fn search_orders_newest_first_with_id_tiebreak() {
        let store = MemoryJobs::default();
        store
            .insert(job("job-000001", "Backend Developer", date(2026, 3, 1)))
            .expect("insert");
        store
            .insert(job("job-000002", "Frontend Developer", date(2026, 3, 3)))
            .expect("insert");
        store
            .insert(job("job-000003", "Data Engineer", date(2026, 3, 3)))
            .expect("insert");

        let page = store
            .search(&JobFilter::default(), PageRequest::new(None, None))
            .expect("search");

        let ids: Vec<&str> = page.items.iter().map(|job| job.id.0.as_str()).collect();
        assert_eq!(ids, vec!["job-000003", "job-000002", "job-000001"]);
    }

    #[test]
    fn search_applies_the_filter_before_paging() {
        let store = MemoryJobs::default();
        store
            .insert(job("job-000001", "Backend Developer", date(2026, 3, 1)))
            .expect("insert");
        store
            .insert(job("job-000002", "Harbour Analyst", date(2026, 3, 2)))
            .expect("insert");

        let filter = JobFilter {
            text: Some("developer".to_string()),
            location: None,
        };
        let page = store
            .search(&filter, PageRequest::new(None, None))
            .expect("search");

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Backend Developer");
    }
}
