use rig::completion::CompletionModel;
use tracing::{debug, info, instrument, warn};

use crate::extraction::chunking::chunk_html;
use crate::extraction::dedup_page_contacts;
use crate::extraction::config::ExtractionConfig;
use crate::extraction::error::ExtractionError;
use crate::extraction::parse::parse_response;
use crate::extraction::prompts::{EXTRACTION_PROMPT_V1, extraction_request};
use crate::extraction::reduce::reduce_html;
use crate::model::complete_text;
use crate::types::{Contact, PageContent};

/// LLM-backed contact extractor
#[derive(Debug, Clone)]
pub struct ContactExtractor<M: CompletionModel> {
    model: M,
    config: ExtractionConfig,
}

impl<M: CompletionModel> ContactExtractor<M> {
    pub fn new(model: M, config: ExtractionConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Send one chunk, retrying with exponential backoff, and return the raw response
    async fn request(&self, organization: &str, source_url: &str, chunk: &str) -> Result<String, ExtractionError> {
        let prompt = extraction_request(organization, source_url, chunk);
        let max_tokens = self.config.max_tokens_for(chunk);
        let attempts = self.config.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            match complete_text(
                &self.model,
                EXTRACTION_PROMPT_V1,
                &prompt,
                self.config.temperature,
                max_tokens,
            )
            .await
            {
                Ok(text) => return Ok(text),
                Err(e) => {
                    let err = ExtractionError::from(e);
                    if attempt + 1 >= attempts {
                        return Err(err);
                    }
                    let delay = self.config.backoff_delay(attempt);
                    warn!(attempt = attempt + 1, error = %err, "extraction request failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Extract contacts from one chunk of markup
    pub async fn extract_chunk(
        &self,
        organization: &str,
        source_url: &str,
        chunk: &str,
    ) -> Result<Vec<Contact>, ExtractionError> {
        let response = self.request(organization, source_url, chunk).await?;
        Ok(parse_response(&response)
            .into_iter()
            .map(|raw| raw.into_contact(organization, source_url))
            .collect())
    }

    /// Extract the contacts on one collected page.
    ///
    /// The markup is reduced and chunked first. A chunk whose request fails
    /// on every attempt contributes nothing; the other chunks still count.
    #[instrument(skip(self, page), fields(url = %page.url))]
    pub async fn extract_page(&self, page: &PageContent) -> Vec<Contact> {
        let reduced = reduce_html(&page.html);
        let chunks = chunk_html(&reduced, self.config.max_chunk_chars, self.config.hard_ceiling_chars);

        let mut contacts = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.chunk_delay()).await;
            }
            match self.extract_chunk(&page.organization, &page.url, chunk).await {
                Ok(found) => {
                    debug!(chunk = i, found = found.len(), "chunk extracted");
                    contacts.extend(found);
                }
                Err(e) => warn!(chunk = i, error = %e, "chunk abandoned"),
            }
        }

        let contacts = dedup_page_contacts(contacts);
        info!(chunks = chunks.len(), contacts = contacts.len(), "extracted contacts");
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock_model::MockCompletionModel;
    use crate::types::FetchMethod;

    fn fast_config() -> ExtractionConfig {
        ExtractionConfig::builder()
            .backoff_base_ms(1)
            .chunk_delay_ms(0)
            .build()
    }

    fn page(html: &str) -> PageContent {
        PageContent {
            url: "https://grace.org/staff".to_string(),
            organization: "Grace Academy".to_string(),
            html: html.to_string(),
            fetch_method: FetchMethod::FastHttp,
            email_count: 1,
        }
    }

    #[tokio::test]
    async fn test_extract_page_parses_and_dedups() {
        let mock = MockCompletionModel::new();
        mock.set_text_response(
            r#"[{"first_name": "Jane", "last_name": "Doe", "title": "Principal", "email": "JDoe@grace.org", "phone": ""},
                {"first_name": "Jane", "last_name": "Doe", "title": "Principal", "email": "jdoe@grace.org", "phone": ""},
                {"first_name": "", "last_name": "", "title": "Office", "email": "", "phone": ""}]"#,
        )
        .await;
        let extractor = ContactExtractor::new(mock.clone(), fast_config());

        let contacts = extractor
            .extract_page(&page("<div><h2>Staff</h2><p>Jane Doe, Principal, jdoe@grace.org</p></div>"))
            .await;

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].title, "Principal");
        assert_eq!(contacts[0].organization, "Grace Academy");
        assert_eq!(contacts[0].source_url, "https://grace.org/staff");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mock = MockCompletionModel::new();
        mock.push_error("503 Service Unavailable").await;
        mock.push_text_response(r#"[{"name": "John Roe", "title": "Dean"}]"#).await;
        let extractor = ContactExtractor::new(mock.clone(), fast_config());

        let contacts = extractor.extract_chunk("Grace Academy", "https://grace.org/staff", "<p>John Roe</p>").await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].first_name, "John");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_yield_no_contacts() {
        let mock = MockCompletionModel::new();
        for _ in 0..3 {
            mock.push_error("connection reset").await;
        }
        let extractor = ContactExtractor::new(mock.clone(), fast_config());

        let contacts = extractor.extract_page(&page("<div>Staff: John Roe</div>")).await;
        assert!(contacts.is_empty());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_each_chunk_is_sent() {
        let mock = MockCompletionModel::new();
        mock.push_text_response(r#"[{"name": "Jane Doe", "email": "jdoe@grace.org"}]"#).await;
        mock.push_text_response("not json at all").await;
        let config = ExtractionConfig::builder()
            .max_chunk_chars(60)
            .hard_ceiling_chars(80)
            .chunk_delay_ms(0)
            .build();
        let extractor = ContactExtractor::new(mock.clone(), config);

        let html = "<ul><li>Staff: Jane Doe jdoe@grace.org</li><li>Staff: John Roe jroe@grace.org</li></ul>";
        let contacts = extractor.extract_page(&page(html)).await;
        assert_eq!(mock.call_count(), 2);
        assert_eq!(contacts.len(), 1);
    }
}
