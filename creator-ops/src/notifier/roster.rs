use std::path::Path;

use cja::Result;
use color_eyre::eyre::WrapErr;

/// Handles to look for in the guild, in file order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Roster {
    handles: Vec<String>,
}

impl Roster {
    /// One handle per line. Blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    #[tracing::instrument(name = "Roster::load", err)]
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Couldn't read roster from {}", path.display()))?;

        Ok(Self::parse(&text))
    }

    pub fn handles(&self) -> &[String] {
        &self.handles
    }
}

impl<S: Into<String>> FromIterator<S> for Roster {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut handles: Vec<String> = Vec::new();
        for handle in iter {
            let handle = handle.into();
            if !handles.contains(&handle) {
                handles.push(handle);
            }
        }

        Self { handles }
    }
}

const DEFAULT_MESSAGE: &str = "Hi {mention},

We noticed that we still don't have your sponsorship data on file.

Could you fill out the sponsorship form that was shared in the server? \
Sponsors require it when choosing creators, without it we can't get you sponsorships.

Thanks!";

/// Reminder text, `{mention}` is replaced with the recipient's mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageTemplate(String);

impl Default for MessageTemplate {
    fn default() -> Self {
        Self(DEFAULT_MESSAGE.to_string())
    }
}

impl MessageTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    #[tracing::instrument(name = "MessageTemplate::load", err)]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Couldn't read message template from {}", path.display()))?;

        Ok(Self::new(text.trim_end()))
    }

    pub fn render(&self, member_id: u64) -> String {
        self.0.replace("{mention}", &format!("<@{member_id}>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blanks_comments_and_duplicates() {
        let roster = Roster::parse(
            "# creators missing the form\nalice\n\n  bob  \nalice\n.element.\n# trailing\n",
        );

        assert_eq!(roster.handles(), ["alice", "bob", ".element."]);
    }

    #[test]
    fn test_handles_are_case_sensitive() {
        let roster: Roster = ["Alice", "alice"].into_iter().collect();

        assert_eq!(roster.handles().len(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_roster_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(Roster::load(&dir.path().join("roster.txt")).await.is_err());
    }

    #[test]
    fn test_render_mentions_member() {
        let template = MessageTemplate::new("Hey {mention}, ping {mention}");

        assert_eq!(template.render(42), "Hey <@42>, ping <@42>");
    }

    #[tokio::test]
    async fn test_default_template_mentions_member() {
        let template = MessageTemplate::load(None).await.unwrap();

        assert!(template.render(7).starts_with("Hi <@7>,"));
    }

    #[tokio::test]
    async fn test_template_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.txt");
        std::fs::write(&path, "Reminder for {mention}\n").unwrap();

        let template = MessageTemplate::load(Some(&path)).await.unwrap();

        assert_eq!(template.render(1), "Reminder for <@1>");
    }
}
