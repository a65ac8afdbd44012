//! Marker-based reconciliation with a remote presentation.
//!
//! Every slide carries a hidden marker `md2gs-slide:<index>` at the start of
//! its speaker notes. Markers are written once; a slide whose marker no
//! longer matches its position is reported as stale and left alone.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::PresentationClient;
use crate::config::DeckConfig;
use crate::error::{Result, SlidesError};
use crate::meta::{find_marker, marker_text, notes_object_id, PresentationMeta};
use crate::render::SlideRenderer;
use crate::slide::Deck;
use crate::wire::{Presentation, Request};

/// Marker insertions for every slide whose notes carry no marker yet.
///
/// Slides without a speaker notes shape are skipped.
pub fn marker_requests(presentation: &Presentation) -> Vec<Request> {
    let mut requests = Vec::new();
    for (position, page) in presentation.slides.iter().enumerate() {
        if find_marker(page).is_some() {
            continue;
        }
        match notes_object_id(page) {
            Some(notes_id) => requests.push(Request::insert_text(notes_id, marker_text(position))),
            None => debug!(slide = %page.object_id, "Slide has no speaker notes shape"),
        }
    }
    requests
}

/// Mark every unmarked slide, then return the presentation's metadata.
///
/// Fetches again only when markers were inserted, so a second call against
/// an unchanged presentation sends no update.
pub async fn ensure_markers<C>(client: &C, presentation_id: &str) -> Result<PresentationMeta>
where
    C: PresentationClient + ?Sized,
{
    let presentation = client.get(presentation_id).await?;
    let requests = marker_requests(&presentation);

    let presentation = if requests.is_empty() {
        presentation
    } else {
        let count = requests.len();
        client
            .batch_update(presentation_id, requests)
            .await
            .map_err(|e| SlidesError::reconcile("ensureMarkers", presentation_id, presentation_id, e))?;
        info!(presentation_id, markers = count, "Inserted slide markers");
        client.get(presentation_id).await?
    };

    let meta = PresentationMeta::from_presentation(&presentation, presentation_id);
    let stale = meta.stale_slides().count();
    if stale > 0 {
        warn!(presentation_id, stale, "Slides moved since they were marked");
    }
    Ok(meta)
}

/// Duplicate a slide and return the new slide's id
pub async fn copy_slide<C>(client: &C, presentation_id: &str, slide_id: &str) -> Result<String>
where
    C: PresentationClient + ?Sized,
{
    let response = client
        .batch_update(presentation_id, vec![Request::duplicate_object(slide_id)])
        .await
        .map_err(|e| SlidesError::reconcile("copySlide", presentation_id, slide_id, e))?;

    let new_id = response
        .duplicated_object_id(0)
        .ok_or_else(|| SlidesError::missing_duplicate_reply(presentation_id, slide_id))?;
    debug!(presentation_id, slide_id, new_id, "Copied slide");
    Ok(new_id.to_string())
}

/// Replacement content for one page element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementUpdate {
    pub element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ElementUpdate {
    pub fn text(element_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            text: Some(text.into()),
            image_url: None,
        }
    }

    pub fn image(element_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            text: None,
            image_url: Some(url.into()),
        }
    }

    /// Text is replaced wholesale and set to shrink on overflow
    pub fn requests(&self) -> Vec<Request> {
        let mut requests = Vec::new();
        if let Some(text) = &self.text {
            requests.push(Request::delete_all_text(&self.element_id));
            if !text.is_empty() {
                requests.push(Request::insert_text(&self.element_id, text));
            }
            requests.push(Request::text_autofit(&self.element_id));
        }
        if let Some(url) = &self.image_url {
            requests.push(Request::replace_image(&self.element_id, url));
        }
        requests
    }
}

/// Apply element updates in one batch. Returns the number of requests sent.
pub async fn edit_slide<C>(client: &C, presentation_id: &str, updates: &[ElementUpdate]) -> Result<usize>
where
    C: PresentationClient + ?Sized,
{
    let requests: Vec<Request> = updates.iter().flat_map(ElementUpdate::requests).collect();
    if requests.is_empty() {
        debug!(presentation_id, "Nothing to edit");
        return Ok(0);
    }

    let count = requests.len();
    let elements = updates
        .iter()
        .map(|u| u.element_id.as_str())
        .collect::<Vec<_>>()
        .join(",");
    client
        .batch_update(presentation_id, requests)
        .await
        .map_err(|e| SlidesError::reconcile("editSlide", presentation_id, elements, e))?;
    Ok(count)
}

/// Outcome of [`push_deck`]
#[derive(Debug, Clone, PartialEq)]
pub struct PushReport {
    /// Object ids of the created slides, in deck order
    pub created: Vec<String>,
    /// Slides removed before appending
    pub deleted: usize,
    /// Requests sent for slide content
    pub requests: usize,
    /// Metadata after markers were written
    pub meta: PresentationMeta,
}

/// Append a compiled deck to a presentation.
///
/// With `erase`, the slides listed in `meta` are deleted first. Speaker
/// notes are written once the slides exist, and markers last, so they end
/// up ahead of the notes text.
pub async fn push_deck<C>(
    client: &C,
    presentation_id: &str,
    deck: &Deck,
    meta: &PresentationMeta,
    config: &DeckConfig,
    erase: bool,
) -> Result<PushReport>
where
    C: PresentationClient + ?Sized,
{
    let mut requests = Vec::new();
    let deleted = if erase {
        requests.extend(meta.slides.iter().map(|s| Request::delete_object(&s.object_id)));
        meta.slides.len()
    } else {
        0
    };

    let insertion_index = if erase { 0 } else { meta.slides.len() };
    let rendered = SlideRenderer::new(config, Some(meta)).render_deck(deck, insertion_index)?;
    let created: Vec<String> = rendered.iter().map(|r| r.object_id.clone()).collect();
    requests.extend(rendered.into_iter().flat_map(|r| r.requests));

    let sent = requests.len();
    if sent > 0 {
        client
            .batch_update(presentation_id, requests)
            .await
            .map_err(|e| SlidesError::reconcile("pushDeck", presentation_id, presentation_id, e))?;
    }
    info!(presentation_id, created = created.len(), deleted, requests = sent, "Pushed deck");

    if deck.slides.iter().any(|s| s.has_notes()) {
        write_notes(client, presentation_id, deck, &created).await?;
    }

    let meta = ensure_markers(client, presentation_id).await?;
    Ok(PushReport {
        created,
        deleted,
        requests: sent,
        meta,
    })
}

async fn write_notes<C>(client: &C, presentation_id: &str, deck: &Deck, created: &[String]) -> Result<()>
where
    C: PresentationClient + ?Sized,
{
    let presentation = client.get(presentation_id).await?;
    let mut requests = Vec::new();

    for (slide, object_id) in deck.slides.iter().zip(created) {
        let Some(notes) = slide.notes.as_deref() else {
            continue;
        };
        let notes_id = presentation
            .slides
            .iter()
            .find(|page| &page.object_id == object_id)
            .and_then(notes_object_id);
        match notes_id {
            Some(notes_id) => requests.push(Request::insert_text(notes_id, notes)),
            None => warn!(slide = %object_id, "Created slide has no speaker notes shape"),
        }
    }

    if requests.is_empty() {
        return Ok(());
    }
    client
        .batch_update(presentation_id, requests)
        .await
        .map_err(|e| SlidesError::reconcile("writeNotes", presentation_id, presentation_id, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn presentation(slides: serde_json::Value) -> Presentation {
        serde_json::from_value(json!({"presentationId": "p1", "slides": slides})).unwrap()
    }

    fn slide(id: &str, notes: Option<&str>) -> serde_json::Value {
        let text = notes.map_or(json!({}), |n| json!({"textElements": [{"textRun": {"content": n}}]}));
        json!({
            "objectId": id,
            "slideProperties": {
                "notesPage": {
                    "objectId": format!("{id}_np"),
                    "notesProperties": {"speakerNotesObjectId": format!("{id}_notes")},
                    "pageElements": [{"objectId": format!("{id}_notes"), "shape": {"text": text}}]
                }
            }
        })
    }

    #[test]
    fn test_marker_requests_skip_marked_and_noteless() {
        let presentation = presentation(json!([
            slide("s0", Some("md2gs-slide:0\n")),
            slide("s1", Some("Talk about it")),
            {"objectId": "s2"},
            slide("s3", Some("md2gs-slide:9\n")),
        ]));
        let requests = marker_requests(&presentation);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            serde_json::to_value(&requests[0]).unwrap(),
            json!({"insertText": {"objectId": "s1_notes", "text": "md2gs-slide:1\n", "insertionIndex": 0}})
        );
    }

    #[test]
    fn test_element_update_requests() {
        let kinds = |u: &ElementUpdate| u.requests().iter().map(Request::kind).collect::<Vec<_>>();
        assert_eq!(
            kinds(&ElementUpdate::text("el1", "ok")),
            ["deleteText", "insertText", "updateShapeProperties"]
        );
        assert_eq!(
            kinds(&ElementUpdate::text("el1", "")),
            ["deleteText", "updateShapeProperties"]
        );
        assert_eq!(kinds(&ElementUpdate::image("img", "https://x.org/a.png")), ["replaceImage"]);
        assert!(ElementUpdate::default().requests().is_empty());
    }

    #[test]
    fn test_element_update_json() {
        let updates: Vec<ElementUpdate> = serde_json::from_value(json!([
            {"elementId": "el1", "text": "ok"},
            {"elementId": "img", "imageUrl": "https://x.org/a.png"}
        ]))
        .unwrap();
        assert_eq!(updates[0], ElementUpdate::text("el1", "ok"));
        assert_eq!(updates[1], ElementUpdate::image("img", "https://x.org/a.png"));
    }
}
