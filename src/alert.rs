//! Alerts for displaying error messages to users.
//!
//! Alerts are swapped into the `#alert-container` element of the page layout.

use maud::{Markup, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Something went wrong.
    Error {
        /// The headline.
        message: String,
        /// What happened and how to fix it.
        details: String,
    },
    /// Something went wrong and the headline says it all.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

impl Alert {
    /// Create an error alert.
    pub fn error(message: &str, details: &str) -> Self {
        Alert::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Render the alert as HTML.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Error { message, details } => (
                "text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 \
                dark:text-red-400 dark:border-red-800",
                message,
                Some(details),
            ),
            Alert::ErrorSimple { message } => (
                "text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 \
                dark:text-red-400 dark:border-red-800",
                message,
                None,
            ),
        };

        html! {
            div
                id="alert"
                role="alert"
                class={ "flex items-start justify-between p-4 mb-4 border rounded-lg " (container_style) }
            {
                div
                {
                    p class="font-semibold" { (message) }

                    @if let Some(details) = details.filter(|details| !details.is_empty()) {
                        p class="text-sm mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Close"
                    class="ms-3 text-lg leading-none"
                    onclick="this.closest('#alert-container').classList.add('hidden')"
                {
                    "×"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let html = Alert::error("Could not save", "Try again later.")
            .into_html()
            .into_string();
        let document = Html::parse_fragment(&html);

        let text = document
            .select(&Selector::parse("#alert").unwrap())
            .next()
            .expect("alert should be rendered")
            .text()
            .collect::<String>();

        assert!(text.contains("Could not save"));
        assert!(text.contains("Try again later."));
    }

    #[test]
    fn simple_alert_has_no_details_paragraph() {
        let html = Alert::ErrorSimple {
            message: "Nope".to_owned(),
        }
        .into_html()
        .into_string();
        let document = Html::parse_fragment(&html);

        let paragraphs = document.select(&Selector::parse("p").unwrap()).count();

        assert_eq!(paragraphs, 1);
    }
}
