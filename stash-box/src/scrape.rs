//! Conversion of remote fragments into scraped entities
//!
//! Nested studio, performer and tag references are matched against the
//! local store inside one read transaction per scene.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use stash_common::models::{
    Gender, ScrapedPerformer, ScrapedScene, ScrapedStudio, ScrapedTag, StashBoxFingerprint,
};

use crate::client::StashBox;
use crate::error::{Result, StashBoxError};
use crate::graphql::{
    BodyModificationFragment, ImageFragment, MeasurementsFragment, PerformerFragment,
    SceneFragment, UrlFragment,
};
use crate::matcher;

/// The first URL of the given type, if any
pub(crate) fn find_url(urls: &[UrlFragment], url_type: &str) -> Option<String> {
    urls.iter()
        .find(|u| u.url_type == url_type)
        .map(|u| u.url.clone())
}

/// `"TRANSGENDER_FEMALE"` becomes `"Transgender Female"`
pub(crate) fn title_case_enum(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn translate_gender(remote: &str) -> Option<String> {
    remote
        .parse::<Gender>()
        .ok()
        .map(|gender| gender.as_str().to_string())
}

pub(crate) fn format_measurements(m: &MeasurementsFragment) -> Option<String> {
    match (m.band_size, m.cup_size.as_deref(), m.waist, m.hip) {
        (Some(band), Some(cup), Some(waist), Some(hip)) => {
            Some(format!("{band}{cup}-{waist}-{hip}"))
        }
        _ => None,
    }
}

pub(crate) fn format_career_length(start: Option<i64>, end: Option<i64>) -> Option<String> {
    match (start, end) {
        (None, None) => None,
        (Some(start), None) => Some(format!("{start} -")),
        (None, Some(end)) => Some(format!("- {end}")),
        (Some(start), Some(end)) => Some(format!("{start} - {end}")),
    }
}

pub(crate) fn format_body_modifications(
    modifications: &[BodyModificationFragment],
) -> Option<String> {
    if modifications.is_empty() {
        return None;
    }

    let parts: Vec<String> = modifications
        .iter()
        .map(|m| match &m.description {
            Some(description) => format!("{}, {}", m.location, description),
            None => m.location.clone(),
        })
        .collect();

    Some(parts.join("; "))
}

/// Map a remote performer fragment to its scraped form. Matching against
/// the local store happens separately.
pub(crate) fn performer_fragment_to_scraped(p: &PerformerFragment) -> ScrapedPerformer {
    let images: Vec<String> = p.images.iter().map(|image| image.url.clone()).collect();

    let mut scraped = ScrapedPerformer {
        name: Some(p.name.clone()),
        country: p.country.clone(),
        measurements: format_measurements(&p.measurements),
        career_length: format_career_length(p.career_start_year, p.career_end_year),
        tattoos: format_body_modifications(&p.tattoos),
        piercings: format_body_modifications(&p.piercings),
        twitter: find_url(&p.urls, "TWITTER"),
        remote_site_id: Some(p.id.clone()),
        image: images.first().cloned(),
        images,
        ..Default::default()
    };

    if let Some(height) = p.height.filter(|h| *h > 0) {
        scraped.height = Some(height.to_string());
    }
    if let Some(birthdate) = &p.birthdate {
        scraped.birthdate = Some(birthdate.date.clone());
    }
    if let Some(gender) = &p.gender {
        scraped.gender = translate_gender(gender);
    }
    if let Some(ethnicity) = &p.ethnicity {
        scraped.ethnicity = Some(title_case_enum(ethnicity));
    }
    if let Some(eye_color) = &p.eye_color {
        scraped.eye_color = Some(title_case_enum(eye_color));
    }
    if let Some(hair_color) = &p.hair_color {
        scraped.hair_color = Some(title_case_enum(hair_color));
    }
    if let Some(breast_type) = &p.breast_type {
        scraped.fake_tits = Some(title_case_enum(breast_type));
    }
    if !p.aliases.is_empty() {
        scraped.aliases = Some(p.aliases.join(", "));
    }

    scraped
}

/// Fetch an image and encode it as a base64 data URI.
pub(crate) async fn fetch_image(
    http: &reqwest::Client,
    cancel: &CancellationToken,
    url: &str,
) -> Result<String> {
    if cancel.is_cancelled() {
        return Err(StashBoxError::Cancelled);
    }

    let send = http.get(url).send();
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(StashBoxError::Cancelled),
        result = send => result?,
    };

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let body = response.bytes().await?;

    Ok(format!(
        "data:{content_type};base64,{}",
        BASE64.encode(&body)
    ))
}

/// The first remote image as a data URI. Fetch failures are logged and
/// swallowed; an image is never load-bearing.
pub(crate) async fn first_image(
    http: &reqwest::Client,
    cancel: &CancellationToken,
    images: &[ImageFragment],
) -> Option<String> {
    let image = images.first()?;
    match fetch_image(http, cancel, &image.url).await {
        Ok(data) => Some(data),
        Err(err) => {
            warn!(url = %image.url, %err, "error fetching image");
            None
        }
    }
}

impl StashBox {
    /// Convert a remote scene fragment into a scraped scene, resolving its
    /// studio, performers and tags against the local store.
    pub(crate) async fn scene_fragment_to_scraped(
        &self,
        cancel: &CancellationToken,
        fragment: &SceneFragment,
    ) -> Result<ScrapedScene> {
        let mut scene = ScrapedScene {
            title: fragment.title.clone(),
            details: fragment.details.clone(),
            date: fragment.date.clone(),
            url: find_url(&fragment.urls, "STUDIO"),
            duration: fragment.duration,
            remote_site_id: Some(fragment.id.clone()),
            fingerprints: fragment
                .fingerprints
                .iter()
                .map(|f| StashBoxFingerprint {
                    algorithm: f.algorithm.as_str().to_string(),
                    hash: f.hash.clone(),
                    duration: f.duration,
                })
                .collect(),
            ..Default::default()
        };

        if !fragment.images.is_empty() {
            scene.image = first_image(self.http(), cancel, &fragment.images).await;
        }

        let endpoint = self.endpoint().to_string();
        let fragment = fragment.clone();

        let (studio, performers, tags) = self
            .repository()
            .with_read_txn(|txn| {
                Box::pin(async move {
                    let mut studio = fragment.studio.as_ref().map(|s| ScrapedStudio {
                        stored_id: None,
                        name: s.name.clone(),
                        url: find_url(&s.urls, "HOME"),
                        remote_site_id: Some(s.id.clone()),
                    });
                    if let Some(studio) = studio.as_mut() {
                        matcher::scraped_studio(txn, studio, Some(&endpoint)).await?;
                    }

                    let mut performers = Vec::with_capacity(fragment.performers.len());
                    for appearance in &fragment.performers {
                        let mut performer = performer_fragment_to_scraped(&appearance.performer);
                        matcher::scraped_performer(txn, &mut performer, Some(&endpoint)).await?;
                        performers.push(performer);
                    }

                    let mut tags = Vec::with_capacity(fragment.tags.len());
                    for tag in &fragment.tags {
                        let mut scraped_tag = ScrapedTag {
                            stored_id: None,
                            name: tag.name.clone(),
                        };
                        matcher::scraped_tag(txn, &mut scraped_tag).await?;
                        tags.push(scraped_tag);
                    }

                    Ok((studio, performers, tags))
                })
            })
            .await?;

        scene.studio = studio;
        scene.performers = performers;
        scene.tags = tags;

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::FuzzyDateFragment;

    #[test]
    fn test_find_url_by_type() {
        let urls = vec![
            UrlFragment {
                url: "https://twitter.com/jane".to_string(),
                url_type: "TWITTER".to_string(),
            },
            UrlFragment {
                url: "https://acme.example".to_string(),
                url_type: "HOME".to_string(),
            },
        ];

        assert_eq!(
            find_url(&urls, "HOME").as_deref(),
            Some("https://acme.example")
        );
        assert!(find_url(&urls, "STUDIO").is_none());
    }

    #[test]
    fn test_title_case_enum() {
        assert_eq!(title_case_enum("CAUCASIAN"), "Caucasian");
        assert_eq!(title_case_enum("TRANSGENDER_FEMALE"), "Transgender Female");
    }

    #[test]
    fn test_format_measurements() {
        let full = MeasurementsFragment {
            band_size: Some(34),
            cup_size: Some("B".to_string()),
            waist: Some(24),
            hip: Some(36),
        };
        assert_eq!(format_measurements(&full).as_deref(), Some("34B-24-36"));

        let partial = MeasurementsFragment {
            band_size: Some(34),
            ..Default::default()
        };
        assert!(format_measurements(&partial).is_none());
    }

    #[test]
    fn test_format_career_length() {
        assert!(format_career_length(None, None).is_none());
        assert_eq!(format_career_length(Some(2010), None).as_deref(), Some("2010 -"));
        assert_eq!(format_career_length(None, Some(2015)).as_deref(), Some("- 2015"));
        assert_eq!(
            format_career_length(Some(2010), Some(2015)).as_deref(),
            Some("2010 - 2015")
        );
    }

    #[test]
    fn test_format_body_modifications() {
        assert!(format_body_modifications(&[]).is_none());

        let mods = vec![
            BodyModificationFragment {
                location: "left arm".to_string(),
                description: Some("rose".to_string()),
            },
            BodyModificationFragment {
                location: "back".to_string(),
                description: None,
            },
        ];
        assert_eq!(
            format_body_modifications(&mods).as_deref(),
            Some("left arm, rose; back")
        );
    }

    #[test]
    fn test_performer_fragment_to_scraped() {
        let fragment = PerformerFragment {
            id: "remote-1".to_string(),
            name: "Jane Example".to_string(),
            aliases: vec!["JE".to_string(), "Janey".to_string()],
            gender: Some("FEMALE".to_string()),
            urls: vec![UrlFragment {
                url: "https://twitter.com/jane".to_string(),
                url_type: "TWITTER".to_string(),
            }],
            birthdate: Some(FuzzyDateFragment {
                date: "1990-01-02".to_string(),
                accuracy: Some("DAY".to_string()),
            }),
            ethnicity: Some("CAUCASIAN".to_string()),
            country: Some("US".to_string()),
            eye_color: Some("BLUE".to_string()),
            hair_color: Some("DARK_BROWN".to_string()),
            height: Some(170),
            measurements: MeasurementsFragment::default(),
            breast_type: Some("NATURAL".to_string()),
            career_start_year: Some(2010),
            career_end_year: None,
            tattoos: vec![],
            piercings: vec![],
            images: vec![
                ImageFragment {
                    id: "i1".to_string(),
                    url: "https://img.example/1.jpg".to_string(),
                    width: None,
                    height: None,
                },
                ImageFragment {
                    id: "i2".to_string(),
                    url: "https://img.example/2.jpg".to_string(),
                    width: None,
                    height: None,
                },
            ],
        };

        let scraped = performer_fragment_to_scraped(&fragment);
        assert_eq!(scraped.name.as_deref(), Some("Jane Example"));
        assert_eq!(scraped.remote_site_id.as_deref(), Some("remote-1"));
        assert_eq!(scraped.gender.as_deref(), Some("FEMALE"));
        assert_eq!(scraped.twitter.as_deref(), Some("https://twitter.com/jane"));
        assert_eq!(scraped.birthdate.as_deref(), Some("1990-01-02"));
        assert_eq!(scraped.ethnicity.as_deref(), Some("Caucasian"));
        assert_eq!(scraped.hair_color.as_deref(), Some("Dark Brown"));
        assert_eq!(scraped.height.as_deref(), Some("170"));
        assert_eq!(scraped.career_length.as_deref(), Some("2010 -"));
        assert_eq!(scraped.aliases.as_deref(), Some("JE, Janey"));
        assert_eq!(scraped.images.len(), 2);
        // deprecated single-image field mirrors the first image
        assert_eq!(scraped.image.as_deref(), Some("https://img.example/1.jpg"));
        assert!(scraped.stored_id.is_none());
    }

    #[test]
    fn test_translate_gender_unknown() {
        assert!(translate_gender("ROBOT").is_none());
        assert_eq!(
            translate_gender("TRANSGENDER_MALE").as_deref(),
            Some("TRANSGENDER_MALE")
        );
    }
}
