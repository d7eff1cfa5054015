use std::sync::{Arc, Mutex};
use std::time::Duration;

use evvl::batch::{run_batch, run_batch_with_progress, BatchSlot};
use evvl::catalog::{filter_for_provider, ModelType, RawModel};
use evvl::classify::is_image_model;
use evvl::transform::{anthropic_supported, transform};
use evvl::{Error, GenerationResult, Provider};

fn raw(id: &str, owner: &str, ty: &str) -> RawModel
{   RawModel
    {   id: id.to_string()
      , name: None
      , provider: owner.to_string()
      , model_type: Some(ty.to_string())
    }
}

fn text(content: &str) -> GenerationResult
{   GenerationResult::Text
    {   content: content.to_string()
      , tokens: Some(1)
      , latency: 0
    }
}

// ===== Model Slug Transformer =====

#[test]
fn test_prefix_stripping_is_idempotent()
{   let cases = [
      (Provider::OpenAI, "openai/gpt-4o")
    , (Provider::OpenAI, "gpt-4o")
    , (Provider::OpenAI, "openai/gpt-5-image")
    , (Provider::Gemini, "google/gemini-flash-1.5")
    , (Provider::Gemini, "google/gemini-2.5-pro")
    , (Provider::OpenRouter, "anthropic/claude-3-opus")
    , (Provider::Ollama, "llama3.1:8b")
    , (Provider::LmStudio, "qwen/qwen3-8b")
    ];
    for (provider, slug) in cases
    {   let once = transform(provider, slug).unwrap();
        let twice = transform(provider, &once).unwrap();
        assert_eq!(once, twice, "{provider}: {slug}");
    }
}

#[test]
fn test_pass_through_providers_keep_slug()
{   assert_eq!(
      transform(Provider::OpenRouter, "google/gemini-flash-1.5").unwrap(),
      "google/gemini-flash-1.5"
    );
    assert_eq!(transform(Provider::Ollama, "mistral").unwrap(), "mistral");
}

#[test]
fn test_name_divergences_are_table_driven()
{   assert_eq!(
      transform(Provider::Gemini, "google/gemini-flash-1.5").unwrap(),
      "gemini-1.5-flash"
    );
    assert_eq!(
      transform(Provider::Gemini, "google/gemini-pro-1.5").unwrap(),
      "gemini-1.5-pro"
    );
    assert_eq!(
      transform(Provider::OpenAI, "openai/gpt-5-image").unwrap(),
      "gpt-image-1"
    );
}

#[test]
fn test_anthropic_hyphen_and_dot_spellings()
{   for slug in ["anthropic/claude-3.5-sonnet", "anthropic/claude-3-5-sonnet", "claude-3-5-sonnet"]
    {   assert_eq!(
          transform(Provider::Anthropic, slug).unwrap(),
          "claude-3-5-sonnet-20241022"
        );
    }
    assert_eq!(
      transform(Provider::Anthropic, "anthropic/claude-sonnet-4.5").unwrap(),
      "claude-sonnet-4-5-20250929"
    );
}

#[test]
fn test_anthropic_mapping_completeness()
{   for native in anthropic_supported()
    {   let mapped = transform(Provider::Anthropic, native).unwrap();
        assert_eq!(mapped, native);
        let prefixed = format!("anthropic/{}", native);
        assert_eq!(transform(Provider::Anthropic, &prefixed).unwrap(), native);
    }
}

#[test]
fn test_anthropic_unlisted_dated_slug_passes()
{   assert_eq!(
      transform(Provider::Anthropic, "anthropic/claude-next-20270101").unwrap(),
      "claude-next-20270101"
    );
}

#[test]
fn test_anthropic_unknown_slug_fails_loudly()
{   let err = transform(Provider::Anthropic, "anthropic/claude-imaginary").unwrap_err();
    assert_eq!(
      err,
      Error::UnknownModel
      {   provider: Provider::Anthropic
        , slug: "anthropic/claude-imaginary".to_string()
      }
    );
    assert!(err.to_string().contains("anthropic/claude-imaginary"));
    assert!(err.is_configuration());
}

// ===== Model Catalog Filter =====

#[test]
fn test_catalog_excludes_open_weight_and_retired()
{   let listing = vec![
      raw("gpt-oss-120b", "OpenAI", "chat")
    , raw("gpt-4-32k", "OpenAI", "chat")
    , raw("gpt-4o", "OpenAI", "chat")
    , raw("claude-2.1", "Anthropic", "chat")
    , raw("claude-3-opus-20240229", "Anthropic", "chat")
    , raw("gemma-3-27b-it", "Google", "chat")
    , raw("gemini-1.0-pro", "Google", "chat")
    , raw("gemini-2.5-flash", "Google", "chat")
    ];

    let openai = filter_for_provider(&listing, Provider::OpenAI);
    assert_eq!(openai.len(), 1);
    assert_eq!(openai[0].value, "gpt-4o");

    // deprecated stays visible, retired does not
    let anthropic = filter_for_provider(&listing, Provider::Anthropic);
    assert_eq!(anthropic.len(), 1);
    assert_eq!(anthropic[0].value, "claude-3-opus-20240229");

    let gemini = filter_for_provider(&listing, Provider::Gemini);
    assert_eq!(gemini.len(), 1);
    assert_eq!(gemini[0].value, "gemini-2.5-flash");
}

#[test]
fn test_catalog_global_exclusions_apply_everywhere()
{   let listing = vec![
      raw("gpt-4o-realtime-preview", "OpenAI", "chat")
    , raw("gpt-4o-mini-tts", "OpenAI", "chat")
    , raw("omni-moderation-latest", "OpenAI", "chat")
    , raw("openai/gpt-4o-audio-preview", "OpenRouter", "chat")
    , raw("openai/gpt-4o", "OpenRouter", "chat")
    ];
    assert!(filter_for_provider(&listing, Provider::OpenAI).is_empty());
    let router = filter_for_provider(&listing, Provider::OpenRouter);
    assert_eq!(router.len(), 1);
    assert_eq!(router[0].value, "openai/gpt-4o");
}

#[test]
fn test_catalog_aggregator_is_permissive()
{   let listing = vec![
      raw("openai/gpt-oss-120b", "OpenRouter", "chat")
    , raw("google/gemma-3-27b-it", "OpenRouter", "chat")
    , raw("google/gemini-2.5-flash-image-preview", "OpenRouter", "image")
    ];
    let entries = filter_for_provider(&listing, Provider::OpenRouter);
    let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
    assert_eq!(values, vec![
      "openai/gpt-oss-120b"
    , "google/gemma-3-27b-it"
    , "google/gemini-2.5-flash-image-preview"
    ]);
    assert_eq!(entries[2].model_type, ModelType::Image);
}

#[test]
fn test_catalog_drops_modalities_provider_cannot_serve()
{   let listing = vec![
      raw("llava", "Ollama", "image")
    , raw("llama3.1", "Ollama", "chat")
    ];
    let entries = filter_for_provider(&listing, Provider::Ollama);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, "llama3.1");
}

// ===== Image/Text Classifier =====

#[test]
fn test_classifier_boundary_precision()
{   assert!(!is_image_model(Provider::OpenAI, "gpt-4o-imageless"));
    assert!(!is_image_model(Provider::Gemini, "gemini-imagery-pro"));
    assert!(!is_image_model(Provider::OpenRouter, "someone/imagenation-7b"));
    assert!(!is_image_model(Provider::OpenRouter, "openai/gpt-4o"));
}

#[test]
fn test_classifier_accepts_prefix_and_trailing_segments()
{   assert!(is_image_model(Provider::OpenRouter, "openai/dall-e-3"));
    assert!(is_image_model(Provider::OpenRouter, "google/gemini-2.5-flash-image-preview"));
    assert!(is_image_model(Provider::OpenAI, "openai/gpt-image-1"));
    assert!(is_image_model(Provider::Gemini, "models/imagen-3.0-generate-002"));
    assert!(is_image_model(Provider::OpenAI, "dall-e-3/latest"));
}

// ===== Batch Executor =====

#[tokio::test]
async fn test_batch_order_is_input_order()
{   let latencies = [150u64, 100, 50];
    let completion = Arc::new(Mutex::new(Vec::new()));

    let results = {
      let completion = completion.clone();
      run_batch(&latencies, move |ms| {
        let completion = completion.clone();
        let ms = *ms;
        async move {
          tokio::time::sleep(Duration::from_millis(ms)).await;
          completion.lock().unwrap().push(ms);
          text(&format!("item-{ms}"))
        }
      })
      .await
    };

    assert_eq!(*completion.lock().unwrap(), vec![50, 100, 150]);
    let contents: Vec<&str> = results.iter().filter_map(|r| r.content()).collect();
    assert_eq!(contents, vec!["item-150", "item-100", "item-50"]);
}

#[tokio::test]
async fn test_batch_progress_fires_in_completion_order()
{   let latencies = [150u64, 100, 50];
    let mut seen = Vec::new();

    let results = run_batch_with_progress(
      &latencies,
      |ms| {
        let ms = *ms;
        async move {
          tokio::time::sleep(Duration::from_millis(ms)).await;
          text(&format!("item-{ms}"))
        }
      },
      |index, result| {
        assert!(result.is_success());
        seen.push(index);
      },
    )
    .await;

    assert_eq!(seen, vec![2, 1, 0]);
    let contents: Vec<&str> = results.iter().filter_map(|r| r.content()).collect();
    assert_eq!(contents, vec!["item-150", "item-100", "item-50"]);
}

#[tokio::test]
async fn test_batch_partial_failure_is_isolated()
{   let items = ["a", "b", "c"];
    let results = run_batch(&items, |item| {
      let item = *item;
      async move {
        if item == "b"
        {   Err(Error::ApiError("OpenAI API error (500): boom".to_string()))
        } else
        {   Ok(text(item))
        }
      }
    })
    .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert!(results[1].is_failure());
    assert_eq!(results[1].error(), Some("OpenAI API error (500): boom"));
    assert!(results[2].is_success());
}

#[tokio::test]
async fn test_batch_empty_input()
{   let items: [u8; 0] = [];
    let mut calls = 0;
    let results = run_batch_with_progress(
      &items,
      |_| async { text("never") },
      |_, _| calls += 1,
    )
    .await;
    assert!(results.is_empty());
    assert_eq!(calls, 0);
}

#[test]
fn test_batch_slot_reports_state()
{   let slot = BatchSlot::Settled(text("done"));
    assert!(slot.is_settled());
    assert_eq!(slot.result().and_then(|r| r.content()), Some("done"));
    assert!(BatchSlot::Pending.result().is_none());
}
