//! [`AlertEmitter`] — turns a trigger match into a submitted job and a
//! persisted alert record.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tripwire_core::{
  alert::Alert,
  event::Event,
  external::{JobSubmitter, ServiceRegistry},
  index::{DocumentIndex, Pagination},
};

use crate::{Error, Result, kind, template, triggers::TriggerStore};

pub struct AlertEmitter<I, R, J> {
  index:    Arc<I>,
  triggers: TriggerStore<I, R>,
  jobs:     Arc<J>,
}

impl<I, R, J> Clone for AlertEmitter<I, R, J> {
  fn clone(&self) -> Self {
    Self {
      index:    Arc::clone(&self.index),
      triggers: self.triggers.clone(),
      jobs:     Arc::clone(&self.jobs),
    }
  }
}

impl<I, R, J> AlertEmitter<I, R, J>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  pub fn new(
    index: Arc<I>,
    triggers: TriggerStore<I, R>,
    jobs: Arc<J>,
  ) -> Self {
    Self { index, triggers, jobs }
  }

  /// React to a trigger match: render the trigger's job template against the
  /// event's data, submit it, and record the alert.
  ///
  /// A disabled trigger emits nothing. A failed submission records nothing;
  /// the failure is surfaced to the caller.
  pub async fn emit(
    &self,
    trigger_id: Uuid,
    event: &Event,
  ) -> Result<Option<Alert>> {
    let trigger = self.triggers.get(trigger_id).await?;
    if !trigger.enabled {
      return Ok(None);
    }

    let payload =
      template::render(serde_json::to_value(&trigger.job)?, &event.data);

    let job_id = self
      .jobs
      .submit(payload)
      .await
      .map_err(|e| Error::upstream("job submission", e))?;

    let alert = Alert {
      alert_id: Uuid::new_v4(),
      trigger_id,
      event_id: event.event_id,
      job_id,
      created_on: Utc::now(),
    };

    let doc = serde_json::to_value(&alert)?;
    let outcome = self
      .index
      .post(kind::ALERT, alert.alert_id, doc)
      .await
      .map_err(|e| Error::upstream("alert persistence", e))?;
    if !outcome.created {
      return Err(Error::InconsistentState(format!(
        "alert document {} was not created",
        alert.alert_id
      )));
    }

    Ok(Some(alert))
  }

  pub async fn get(&self, id: Uuid) -> Result<Alert> {
    let doc = self
      .index
      .get(kind::ALERT, id)
      .await
      .map_err(|e| Error::upstream("alert fetch", e))?
      .ok_or(Error::AlertNotFound(id))?;
    Ok(serde_json::from_value(doc)?)
  }

  pub async fn list(&self, page: &Pagination) -> Result<(Vec<Alert>, u64)> {
    let scanned = self
      .index
      .scan(kind::ALERT, page)
      .await
      .map_err(|e| Error::upstream("alert scan", e))?;

    let alerts = scanned
      .hits
      .into_iter()
      .map(serde_json::from_value::<Alert>)
      .collect::<Result<Vec<_>, _>>()?;

    Ok((alerts, scanned.total))
  }

  /// All alerts emitted for `trigger_id`, oldest first.
  pub async fn list_by_trigger(
    &self,
    trigger_id: Uuid,
  ) -> Result<(Vec<Alert>, u64)> {
    let mut matched: Vec<Alert> = Vec::new();
    let mut page = Pagination::default();
    loop {
      let scanned = self
        .index
        .scan(kind::ALERT, &page)
        .await
        .map_err(|e| Error::upstream("alert scan", e))?;
      if scanned.hits.is_empty() {
        break;
      }
      for hit in scanned.hits {
        let alert: Alert = serde_json::from_value(hit)?;
        if alert.trigger_id == trigger_id {
          matched.push(alert);
        }
      }
      page.page += 1;
    }
    matched.sort_by_key(|a| a.created_on);
    let total = matched.len() as u64;
    Ok((matched, total))
  }

  pub async fn delete(&self, id: Uuid) -> Result<bool> {
    self
      .index
      .delete(kind::ALERT, id)
      .await
      .map_err(|e| Error::upstream("alert deletion", e))
  }
}
