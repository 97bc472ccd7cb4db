//! Argument descriptor and its validation pipeline.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use slash_api::{OptionChoice, OptionExtras, OptionSchema};
use thiserror::Error;

use super::{extract, ArgumentKind, ArgumentValue, Arguments};
use crate::error::ConfigError;
use crate::interaction::Interaction;

/// Deferred default, computed from the request when the value is absent
pub type DefaultProvider<R> =
    Arc<dyn for<'a> Fn(&'a R) -> BoxFuture<'a, anyhow::Result<ArgumentValue>> + Send + Sync>;

/// Transform applied to a present raw value
pub type Mapper<R> = Arc<
    dyn for<'a> Fn(ArgumentValue, &'a R) -> BoxFuture<'a, anyhow::Result<ArgumentValue>>
        + Send
        + Sync,
>;

/// Predicate a present value must satisfy
pub type Filter<R> = Arc<
    dyn for<'a> Fn(&'a ArgumentValue, &'a R) -> BoxFuture<'a, anyhow::Result<bool>> + Send + Sync,
>;

/// Default used when an optional argument is absent
pub enum ArgumentDefault<R> {
    Value(ArgumentValue),
    Provider(DefaultProvider<R>),
}

impl<R> Clone for ArgumentDefault<R> {
    fn clone(&self) -> Self {
        match self {
            ArgumentDefault::Value(value) => ArgumentDefault::Value(value.clone()),
            ArgumentDefault::Provider(provider) => ArgumentDefault::Provider(provider.clone()),
        }
    }
}

/// User-facing validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Message shown to the user
    pub message: String,
    /// Name of the argument that failed, if the failure came from one
    pub source: Option<String>,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>, source: Option<String>) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

/// Result of running one argument through the pipeline
#[derive(Debug, Clone)]
pub enum ArgumentOutcome {
    /// The value (absent if optional and not provided) and the slot it goes to
    Valid {
        value: Option<ArgumentValue>,
        apply_to: usize,
    },
    Invalid(ValidationFailure),
}

impl ArgumentOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ArgumentOutcome::Valid { .. })
    }
}

/// Runtime failure inside a mapper or default provider
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Mapper for argument \"{argument}\" failed: {source}")]
    Mapper {
        argument: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Default provider for argument \"{argument}\" failed: {source}")]
    Default {
        argument: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A typed, self-validating command argument
pub struct Argument<R> {
    name: String,
    description: String,
    kind: ArgumentKind,
    required: bool,
    default: Option<ArgumentDefault<R>>,
    mapper: Option<Mapper<R>>,
    filter: Option<Filter<R>>,
    error: Option<String>,
    ignore_if_defined: Option<isize>,
    extras: OptionExtras,
}

impl<R> Clone for Argument<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind,
            required: self.required,
            default: self.default.clone(),
            mapper: self.mapper.clone(),
            filter: self.filter.clone(),
            error: self.error.clone(),
            ignore_if_defined: self.ignore_if_defined,
            extras: self.extras.clone(),
        }
    }
}

impl<R> fmt::Debug for Argument<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default.is_some())
            .field("mapper", &self.mapper.is_some())
            .field("filter", &self.filter.is_some())
            .field("ignore_if_defined", &self.ignore_if_defined)
            .finish_non_exhaustive()
    }
}

impl<R: Interaction> Argument<R> {
    /// Start describing an argument
    pub fn builder(
        kind: ArgumentKind,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> ArgumentBuilder<R> {
        ArgumentBuilder {
            inner: Argument {
                name: name.into(),
                description: description.into(),
                kind,
                required: true,
                default: None,
                mapper: None,
                filter: None,
                error: None,
                ignore_if_defined: None,
                extras: OptionExtras::default(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn ignore_if_defined(&self) -> Option<isize> {
        self.ignore_if_defined
    }

    /// Run the argument against a request.
    ///
    /// `args` holds the values accumulated so far and `index` is this
    /// argument's position in its command. Filter rejections and filter
    /// errors both come back as [`ArgumentOutcome::Invalid`]; mapper and
    /// default-provider errors are returned as [`ArgumentError`].
    pub async fn run(
        &self,
        source: &R,
        args: &Arguments,
        index: usize,
    ) -> Result<ArgumentOutcome, ArgumentError> {
        let apply_to = self.resolve_index(args, index);

        let raw = match extract(self.kind, source, &self.name, self.required) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(
                    argument = %self.name,
                    accessor = self.kind.accessor(),
                    error = %err,
                    "Argument extraction rejected"
                );
                let message = self.error.clone().unwrap_or_else(|| err.to_string());
                return Ok(ArgumentOutcome::Invalid(ValidationFailure::new(
                    message,
                    Some(self.name.clone()),
                )));
            }
        };

        let Some(raw) = raw else {
            let value = match &self.default {
                Some(ArgumentDefault::Value(value)) => Some(value.clone()),
                Some(ArgumentDefault::Provider(provider)) => {
                    Some(provider(source).await.map_err(|source| {
                        ArgumentError::Default {
                            argument: self.name.clone(),
                            source,
                        }
                    })?)
                }
                None => None,
            };
            return Ok(ArgumentOutcome::Valid { value, apply_to });
        };

        let value = match &self.mapper {
            Some(mapper) => mapper(raw, source)
                .await
                .map_err(|source| ArgumentError::Mapper {
                    argument: self.name.clone(),
                    source,
                })?,
            None => raw,
        };

        if let Some(filter) = &self.filter {
            let passed = match filter(&value, source).await {
                Ok(passed) => passed,
                Err(err) => {
                    tracing::debug!(argument = %self.name, error = %err, "Argument filter failed");
                    false
                }
            };

            if !passed {
                return Ok(ArgumentOutcome::Invalid(ValidationFailure::new(
                    self.error.clone().unwrap_or_default(),
                    Some(self.name.clone()),
                )));
            }
        }

        Ok(ArgumentOutcome::Valid {
            value: Some(value),
            apply_to,
        })
    }

    /// Slot this argument writes to: the `ignore_if_defined` target while
    /// that slot is unset, otherwise its own index
    fn resolve_index(&self, args: &Arguments, index: usize) -> usize {
        let Some(offset) = self.ignore_if_defined else {
            return index;
        };

        let target = if offset < 0 {
            index as isize + offset
        } else {
            offset
        };

        if target < 0 {
            tracing::warn!(
                argument = %self.name,
                offset,
                "ignore_if_defined points before the first argument, keeping own slot"
            );
            return index;
        }

        let target = target as usize;
        if args.is_set(target) {
            index
        } else {
            target
        }
    }

    /// Wire-schema descriptor for this argument
    pub fn schema(&self) -> OptionSchema {
        OptionSchema::argument(
            self.kind.option_type(),
            &self.name,
            &self.description,
            self.required,
        )
        .extras(self.extras.clone())
    }
}

/// Builder for [`Argument`]
pub struct ArgumentBuilder<R> {
    inner: Argument<R>,
}

impl<R: Interaction> ArgumentBuilder<R> {
    /// Mark as not required
    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.inner.required = required;
        self
    }

    /// Value used when the argument is absent
    pub fn default(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.inner.default = Some(ArgumentDefault::Value(value.into()));
        self
    }

    /// Compute the default from the request when the argument is absent
    pub fn default_with<F>(mut self, provider: F) -> Self
    where
        F: for<'a> Fn(&'a R) -> BoxFuture<'a, anyhow::Result<ArgumentValue>>
            + Send
            + Sync
            + 'static,
    {
        self.inner.default = Some(ArgumentDefault::Provider(Arc::new(provider)));
        self
    }

    /// Transform the raw value
    pub fn map<F>(self, mapper: F) -> Self
    where
        F: Fn(ArgumentValue, &R) -> anyhow::Result<ArgumentValue> + Send + Sync + 'static,
    {
        self.map_async(move |value, source| {
            let mapped = mapper(value, source);
            Box::pin(async move { mapped })
        })
    }

    pub fn map_async<F>(mut self, mapper: F) -> Self
    where
        F: for<'a> Fn(ArgumentValue, &'a R) -> BoxFuture<'a, anyhow::Result<ArgumentValue>>
            + Send
            + Sync
            + 'static,
    {
        self.inner.mapper = Some(Arc::new(mapper));
        self
    }

    /// Reject values for which the predicate is false; requires [`error`](Self::error)
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&ArgumentValue, &R) -> bool + Send + Sync + 'static,
    {
        self.filter_async(move |value, source| {
            let passed = predicate(value, source);
            Box::pin(async move { Ok(passed) })
        })
    }

    pub fn filter_async<F>(mut self, predicate: F) -> Self
    where
        F: for<'a> Fn(&'a ArgumentValue, &'a R) -> BoxFuture<'a, anyhow::Result<bool>>
            + Send
            + Sync
            + 'static,
    {
        self.inner.filter = Some(Arc::new(predicate));
        self
    }

    /// Message shown when the filter rejects the value
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.inner.error = Some(message.into());
        self
    }

    /// Write into another argument's slot while that slot is unset.
    ///
    /// Non-negative values are absolute indices, negative values are relative
    /// to this argument's own index.
    pub fn ignore_if_defined(mut self, index: isize) -> Self {
        self.inner.ignore_if_defined = Some(index);
        self
    }

    pub fn choices(mut self, choices: Vec<OptionChoice>) -> Self {
        self.inner.extras.choices = Some(choices);
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.inner.extras.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.inner.extras.max_value = Some(max);
        self
    }

    pub fn min_length(mut self, min: u16) -> Self {
        self.inner.extras.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: u16) -> Self {
        self.inner.extras.max_length = Some(max);
        self
    }

    pub fn autocomplete(mut self, enabled: bool) -> Self {
        self.inner.extras.autocomplete = Some(enabled);
        self
    }

    pub fn channel_types(mut self, types: Vec<u8>) -> Self {
        self.inner.extras.channel_types = Some(types);
        self
    }

    /// Finish the descriptor, checking its configuration
    pub fn build(self) -> Result<Argument<R>, ConfigError> {
        let argument = self.inner;

        if argument.filter.is_some() && argument.error.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::FilterWithoutError {
                argument: argument.name,
            });
        }

        if argument.required && argument.default.is_some() {
            return Err(ConfigError::DefaultOnRequired {
                argument: argument.name,
            });
        }

        if let Some(ArgumentDefault::Value(value)) = &argument.default {
            if !argument.kind.accepts(value) {
                return Err(ConfigError::DefaultKindMismatch {
                    argument: argument.name,
                    expected: argument.kind,
                });
            }
        }

        if argument.required && argument.ignore_if_defined.is_some() {
            return Err(ConfigError::IgnoreIfDefinedOnRequired {
                argument: argument.name,
            });
        }

        Ok(argument)
    }
}
