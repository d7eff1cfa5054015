//! Ordered fan-out over dataset items.
//!
//! Every item is launched at once, with no concurrency cap: datasets
//! are hand-curated and small. Results land in the slot of their input
//! index, so the returned order always equals the input order. No
//! retry and no cancellation happen here; retries belong to the caller.

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;

use crate::client::DispatchRouter;
use crate::request::{GenerationRequest, GenerationResult};
use crate::Modality;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("static pattern")
});

/// One pre-allocated output cell. Settles exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchSlot
{   Pending
  , Settled(GenerationResult)
}

impl BatchSlot
{   pub fn is_settled(&self) -> bool
    {   matches!(self, BatchSlot::Settled(_))
    }

    pub fn result(&self) -> Option<&GenerationResult>
    {   match self
        {   BatchSlot::Settled(result) => Some(result)
          , BatchSlot::Pending => None
        }
    }

    fn settle(&mut self, result: GenerationResult)
    {   debug_assert!(!self.is_settled(), "batch slot settled twice");
        *self = BatchSlot::Settled(result);
    }

    fn into_result(self) -> GenerationResult
    {   match self
        {   BatchSlot::Settled(result) => result
          , BatchSlot::Pending => GenerationResult::failure("Batch item never completed")
        }
    }
}

/// Run `generate_one` for every item concurrently; element `k` of the
/// output is always the outcome for `items[k]`.
pub async fn run_batch<'a, T, F, Fut, R>(items: &'a [T], generate_one: F)
  -> Vec<GenerationResult>
where
  F: Fn(&'a T) -> Fut
, Fut: Future<Output = R>
, R: Into<GenerationResult>
{   debug!("Running batch of {} items", items.len());
    join_all(items.iter().map(|item| {
      let call = generate_one(item);
      async move {
        let result: GenerationResult = call.await.into();
        result
      }
    }))
    .await
}

/// Like [`run_batch`], but reports each outcome as it arrives.
///
/// `on_settled(index, result)` fires in completion order; the returned
/// vector is still in input order.
pub async fn run_batch_with_progress<'a, T, F, Fut, R, P>(
  items: &'a [T]
, generate_one: F
, mut on_settled: P
) -> Vec<GenerationResult>
where
  F: Fn(&'a T) -> Fut
, Fut: Future<Output = R>
, R: Into<GenerationResult>
, P: FnMut(usize, &GenerationResult)
{   let mut slots: Vec<BatchSlot> = vec![BatchSlot::Pending; items.len()];
    let mut in_flight = items
      .iter()
      .enumerate()
      .map(|(index, item)| {
        let call = generate_one(item);
        async move {
          let result: GenerationResult = call.await.into();
          (index, result)
        }
      })
      .collect::<FuturesUnordered<_>>();

    while let Some((index, result)) = in_flight.next().await
    {   trace!("Batch slot {} settled (failure: {})", index, result.is_failure());
        on_settled(index, &result);
        slots[index].settle(result);
    }
    slots.into_iter().map(BatchSlot::into_result).collect()
}

/// A dataset row: named variables substituted into a prompt template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetItem
{   pub id: String
  , #[serde(default)]
    pub name: Option<String>
  , #[serde(default)]
    pub variables: HashMap<String, String>
}

/// Replace `{{name}}` placeholders; unknown names are left as written
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String
{   PLACEHOLDER
      .replace_all(template, |caps: &Captures| {
        variables
          .get(&caps[1])
          .cloned()
          .unwrap_or_else(|| caps[0].to_string())
      })
      .into_owned()
}

/// Run `template` (its prompt used as the template) once per dataset item
pub async fn run_dataset(
  router: &DispatchRouter
, template: &GenerationRequest
, modality: Modality
, items: &[DataSetItem]
) -> Vec<GenerationResult>
{   run_batch(items, |item| {
      let mut request = template.clone();
      request.prompt = render_template(&template.prompt, &item.variables);
      async move { router.generate(&request, modality).await }
    })
    .await
}

#[cfg(test)]
mod tests
{   use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String>
    {   pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn renders_known_placeholders()
    {   let out = render_template(
          "Translate {{ text }} to {{lang}}.",
          &vars(&[("text", "hello"), ("lang", "French")])
        );
        assert_eq!(out, "Translate hello to French.");
    }

    #[test]
    fn leaves_unknown_placeholders()
    {   assert_eq!(render_template("Hi {{who}}", &vars(&[])), "Hi {{who}}");
    }

    #[test]
    fn empty_batch_is_empty()
    {   let items: Vec<u32> = vec![];
        let out = tokio_test::block_on(run_batch(&items, |_| async {
          GenerationResult::failure("unreachable")
        }));
        assert!(out.is_empty());
    }

    #[test]
    fn pending_slot_never_leaks_as_success()
    {   assert!(BatchSlot::Pending.into_result().is_failure());
    }
}
