//! Input validation for catalog content
//!
//! Creation and update payloads are validated before touching the store:
//! video lessons need a positive duration, the primary language must be a
//! member of the available languages, and every declared subtitle language
//! must come with a URL.

use crate::error::{CatalogError, Result};
use crate::models::lesson::{ContentType, NewLesson, UpdateLesson};
use crate::models::program::{NewProgram, UpdateProgram};
use serde_json::Value;

/// Validate a lesson creation payload
pub fn validate_new_lesson(new_lesson: &NewLesson) -> Result<()> {
    if new_lesson.content_type == ContentType::Video
        && !new_lesson.duration_ms.is_some_and(|d| d > 0)
    {
        return Err(CatalogError::ValidationError(
            "Duration is required for video content".to_string(),
        ));
    }

    validate_primary_language(
        &new_lesson.content_language_primary,
        &new_lesson.content_languages_available,
    )?;

    validate_subtitle_urls(
        &new_lesson.subtitle_languages,
        new_lesson.subtitle_urls_by_language.as_ref(),
    )
}

/// Validate a lesson update payload.
///
/// Cross-field checks only apply when both sides of the pair are present in
/// the partial update; single-field updates are checked against nothing.
pub fn validate_lesson_update(update: &UpdateLesson) -> Result<()> {
    if let (Some(primary), Some(available)) = (
        &update.content_language_primary,
        &update.content_languages_available,
    ) {
        validate_primary_language(primary, available)?;
    }

    if let (Some(languages), Some(urls)) = (
        &update.subtitle_languages,
        update.subtitle_urls_by_language.as_ref(),
    ) {
        validate_subtitle_urls(languages, Some(urls))?;
    }

    Ok(())
}

/// Validate a program creation payload
pub fn validate_new_program(new_program: &NewProgram) -> Result<()> {
    validate_primary_language(
        &new_program.language_primary,
        &new_program.languages_available,
    )
}

/// Validate a program update payload
pub fn validate_program_update(update: &UpdateProgram) -> Result<()> {
    if let (Some(primary), Some(available)) =
        (&update.language_primary, &update.languages_available)
    {
        validate_primary_language(primary, available)?;
    }

    Ok(())
}

fn validate_primary_language(primary: &str, available: &[String]) -> Result<()> {
    if !available.iter().any(|lang| lang == primary) {
        return Err(CatalogError::ValidationError(
            "Primary language must be included in available languages".to_string(),
        ));
    }

    Ok(())
}

fn validate_subtitle_urls(languages: &[String], urls: Option<&Value>) -> Result<()> {
    if languages.is_empty() {
        return Ok(());
    }

    let urls = urls.and_then(Value::as_object);
    let missing: Vec<&str> = languages
        .iter()
        .filter(|lang| !urls.is_some_and(|map| map.contains_key(lang.as_str())))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return Err(CatalogError::ValidationError(format!(
            "Missing subtitle URLs for languages: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn video_lesson() -> NewLesson {
        NewLesson {
            term_id: Uuid::new_v4(),
            lesson_number: 1,
            title: "Photosynthesis".to_string(),
            content_type: ContentType::Video,
            duration_ms: Some(720_000),
            is_paid: false,
            content_language_primary: "en".to_string(),
            content_languages_available: vec!["en".to_string(), "fr".to_string()],
            content_urls_by_language: json!({"en": "https://cdn.example.com/photo-en.mp4"}),
            subtitle_languages: vec![],
            subtitle_urls_by_language: None,
        }
    }

    #[test]
    fn test_video_without_duration_is_rejected() {
        let mut lesson = video_lesson();
        lesson.duration_ms = None;
        assert!(matches!(
            validate_new_lesson(&lesson),
            Err(CatalogError::ValidationError(_))
        ));

        lesson.duration_ms = Some(0);
        assert!(validate_new_lesson(&lesson).is_err());
    }

    #[test]
    fn test_article_without_duration_is_accepted() {
        let mut lesson = video_lesson();
        lesson.content_type = ContentType::Article;
        lesson.duration_ms = None;
        assert!(validate_new_lesson(&lesson).is_ok());
    }

    #[test]
    fn test_primary_language_must_be_available() {
        let mut lesson = video_lesson();
        lesson.content_language_primary = "de".to_string();
        let err = validate_new_lesson(&lesson).unwrap_err();
        assert!(err.to_string().contains("Primary language"));
    }

    #[test]
    fn test_subtitle_languages_require_urls() {
        let mut lesson = video_lesson();
        lesson.subtitle_languages = vec!["en".to_string(), "fr".to_string()];
        lesson.subtitle_urls_by_language = Some(json!({"en": "https://cdn.example.com/photo-en.vtt"}));

        let err = validate_new_lesson(&lesson).unwrap_err();
        assert!(err.to_string().contains("fr"));

        lesson.subtitle_urls_by_language = Some(json!({
            "en": "https://cdn.example.com/photo-en.vtt",
            "fr": "https://cdn.example.com/photo-fr.vtt"
        }));
        assert!(validate_new_lesson(&lesson).is_ok());
    }

    #[test]
    fn test_partial_update_skips_cross_field_checks() {
        let update = UpdateLesson {
            content_language_primary: Some("de".to_string()),
            ..Default::default()
        };
        // No available-languages list in the update, nothing to check against.
        assert!(validate_lesson_update(&update).is_ok());
    }

    #[test]
    fn test_program_primary_language_must_be_available() {
        let program = NewProgram {
            title: "Biology".to_string(),
            description: None,
            language_primary: "pt".to_string(),
            languages_available: vec!["en".to_string()],
            topic_ids: vec![],
        };
        assert!(validate_new_program(&program).is_err());
    }
}
