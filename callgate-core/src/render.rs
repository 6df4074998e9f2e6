//! Renders call configurations into service calls.

use crate::error::RenderError;
use crate::schema::{ServiceCallConfig, ServiceSource};
use crate::template::{TemplateEngine, TemplateError, is_template};
use callgate_types::{ATTR_ENTITY_ID, Context, ServiceCall, ServiceName, Variables};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Walks configuration values and renders their template leaves.
///
/// Inputs are only ever borrowed; every render builds new values, so the
/// caller's configuration is left exactly as it was.
#[derive(Clone)]
pub struct ConfigRenderer {
    engine: Arc<dyn TemplateEngine>,
}

impl ConfigRenderer {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    /// Renders every template string inside `value`.
    ///
    /// Mappings and sequences are walked recursively. Strings without
    /// template markup and non-string scalars are copied unchanged. The
    /// first failing leaf fails the whole render.
    pub fn render_value(&self, value: &Value, variables: &Variables) -> Result<Value, TemplateError> {
        match value {
            Value::String(s) if is_template(s) => {
                Ok(Value::String(self.engine.render(s, variables)?))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, variables))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => self.render_map(map, variables).map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    fn render_map(
        &self,
        map: &Map<String, Value>,
        variables: &Variables,
    ) -> Result<Map<String, Value>, TemplateError> {
        map.iter()
            .map(|(k, v)| {
                self.render_value(v, variables)
                    .map(|rendered| (k.clone(), rendered))
            })
            .collect()
    }

    /// Resolves the `(domain, service)` pair of a configuration.
    pub fn render_service(
        &self,
        source: &ServiceSource,
        variables: &Variables,
    ) -> Result<(String, String), RenderError> {
        match source {
            ServiceSource::Literal(name) => name
                .split_once('.')
                .map(|(d, s)| (d.to_string(), s.to_string()))
                .ok_or_else(|| RenderError::InvalidService(name.clone())),
            ServiceSource::Template(template) => {
                let rendered = self
                    .engine
                    .render(template, variables)
                    .map_err(RenderError::ServiceTemplate)?;
                let name: ServiceName = rendered
                    .parse()
                    .map_err(|_| RenderError::InvalidService(rendered.clone()))?;
                Ok((name.domain().to_string(), name.service().to_string()))
            }
        }
    }

    /// Builds the service call described by `config`.
    ///
    /// Static `data` comes first, rendered `data_template` keys override it,
    /// and the configured `entity_id` is applied last.
    pub fn render_call(
        &self,
        config: &ServiceCallConfig,
        context: Context,
        variables: &Variables,
    ) -> Result<ServiceCall, RenderError> {
        let (domain, service) = self.render_service(&config.service, variables)?;

        let mut data = config.data.clone();
        if let Some(template) = &config.data_template {
            let rendered = self
                .render_map(template, variables)
                .map_err(RenderError::DataTemplate)?;
            data.extend(rendered);
        }
        if let Some(target) = &config.entity_id {
            data.insert(ATTR_ENTITY_ID.to_string(), target.clone());
        }

        Ok(ServiceCall::new(domain, service, data, context))
    }
}
