//! Localized user notifications
//!
//! Every [`AppError`](crate::error::AppError) maps onto a [`Notice`]: a fluent
//! message id plus its arguments. [`Notifier`] turns notices into the short
//! sentence shown to the user. Only the en-US bundle is built in; any other
//! requested locale falls back to it.

use fluent::{FluentArgs, FluentBundle, FluentResource};
use tracing::warn;
use unic_langid::LanguageIdentifier;

use crate::error::AppError;

const FALLBACK_LOCALE: &str = "en-US";

const BUILTIN_BUNDLES: &[(&str, &str)] = &[(FALLBACK_LOCALE, include_str!("../locales/en-US/billing.ftl"))];

/// A message id and its arguments, independent of locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: &'static str,
    pub args: Vec<(&'static str, String)>,
}

impl Notice {
    pub fn new(id: &'static str) -> Self {
        Self { id, args: Vec::new() }
    }

    pub fn with_arg(mut self, name: &'static str, value: impl ToString) -> Self {
        self.args.push((name, value.to_string()));
        self
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub struct Notifier {
    bundle: FluentBundle<FluentResource>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").field("locales", &self.bundle.locales).finish()
    }
}

impl Notifier {
    /// Builds a notifier for `tag`, falling back to en-US
    pub fn new(tag: &str) -> Result<Self, AppError> {
        let requested: Option<LanguageIdentifier> = tag.parse().ok();
        let (locale, source) = BUILTIN_BUNDLES
            .iter()
            .find(|(builtin, _)| {
                let builtin: Option<LanguageIdentifier> = builtin.parse().ok();
                matches!((&requested, &builtin), (Some(r), Some(b)) if r.language == b.language)
            })
            .copied()
            .unwrap_or(BUILTIN_BUNDLES[0]);
        Self::from_ftl(locale, source)
    }

    pub fn en_us() -> Result<Self, AppError> {
        Self::new(FALLBACK_LOCALE)
    }

    /// Builds a notifier from FTL source
    pub fn from_ftl(locale: &str, source: &str) -> Result<Self, AppError> {
        let langid: LanguageIdentifier = locale
            .parse()
            .map_err(|_| AppError::Localization(format!("invalid locale '{}'", locale)))?;
        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            AppError::Localization(format!("{} parse error(s) in {} messages", errors.len(), locale))
        })?;

        let mut bundle = FluentBundle::new(vec![langid]);
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).map_err(|errors| {
            AppError::Localization(format!("{} duplicate message(s) in {} bundle", errors.len(), locale))
        })?;
        Ok(Self { bundle })
    }

    pub fn locale(&self) -> Option<&LanguageIdentifier> {
        self.bundle.locales.first()
    }

    pub fn has_message(&self, id: &str) -> bool {
        self.bundle.has_message(id)
    }

    /// Formats a notice; an unknown id renders as the id itself
    pub fn render(&self, notice: &Notice) -> String {
        let Some(pattern) = self.bundle.get_message(notice.id).and_then(|m| m.value()) else {
            warn!(message_id = notice.id, "No localized message");
            return notice.id.to_string();
        };

        let mut args = FluentArgs::new();
        for (name, value) in &notice.args {
            args.set(*name, value.clone());
        }

        let mut errors = Vec::new();
        let text = self.bundle.format_pattern(pattern, Some(&args), &mut errors);
        if !errors.is_empty() {
            warn!(message_id = notice.id, errors = ?errors, "Message formatted with errors");
        }
        text.into_owned()
    }
}
