//! CLI command implementations
//!
//! `decode` and `encode` attach the schema to a single element of an
//! in-memory document and drive its scheduler until idle before reporting,
//! so the report includes the deferred initial notifications and
//! `missing-required` errors.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use serde_json::{json, Map, Value as Json};

use crate::collection::Collection;
use crate::config::ApiConfig;
use crate::events::{ApiEvent, CHANGE, ERROR, NEW_ELEMENT};
use crate::host::memory::MemoryDocument;
use crate::host::ElementId;
use crate::html_api::HtmlApi;
use crate::runtime::Scheduler;
use crate::schema::{Schema, SchemaDefinition, SchemaLoader};
use crate::types::Value;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command and write its JSON response
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    // stdout carries the JSON response
    let filter = if verbose { "trace" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Json> {
    match cmd {
        Command::Check { schema, config } => check(&schema, config.as_deref()),
        Command::Decode {
            schema,
            attributes,
            tag,
            config,
        } => decode(&schema, &attributes, &tag, config.as_deref()),
        Command::Encode {
            schema,
            values,
            attributes,
            tag,
            config,
        } => encode(&schema, &values, &attributes, &tag, config.as_deref()),
    }
}

/// Validate a schema file, or every `*.json` schema in a directory
pub fn check(schema: &Path, config: Option<&Path>) -> CliResult<Json> {
    let config = load_config(config)?;

    let mut schemas = Map::new();
    for (name, definition) in load_definitions(schema)? {
        let api = HtmlApi::define_with(definition, config.clone())?;
        schemas.insert(name, describe(api.schema()));
    }

    Ok(json!({ "schemas": schemas }))
}

/// Attach a schema to one element carrying `attributes`
pub fn decode(
    schema: &Path,
    attributes: &[String],
    tag: &str,
    config: Option<&Path>,
) -> CliResult<Json> {
    let api = define_single(schema, config)?;
    let attributes = parse_pairs(attributes)?;

    let session = Session::start(&api, tag, &attributes)?;
    session.settle();
    session.report()
}

/// Set option values on one element and report its attributes
pub fn encode(
    schema: &Path,
    values: &[String],
    attributes: &[String],
    tag: &str,
    config: Option<&Path>,
) -> CliResult<Json> {
    let api = define_single(schema, config)?;
    let attributes = parse_pairs(attributes)?;

    let mut parsed = Vec::with_capacity(values.len());
    for (option, text) in parse_pairs(values)? {
        let value: Json = serde_json::from_str(&text).map_err(|e| {
            CliError::invalid_argument(format!("Invalid JSON for option \"{}\": {}", option, e))
        })?;
        parsed.push((option, Value::from_json(value)));
    }

    let session = Session::start(&api, tag, &attributes)?;
    let binding = session.collection.for_element(session.element)?;
    for (option, value) in parsed {
        binding.options().set(&option, value)?;
    }
    session.settle();
    session.report()
}

/// One element bound to a schema, with every event it publishes recorded
struct Session {
    document: MemoryDocument,
    element: ElementId,
    collection: Collection,
    events: Rc<RefCell<Vec<Json>>>,
}

impl Session {
    fn start(api: &HtmlApi, tag: &str, attributes: &[(String, String)]) -> CliResult<Self> {
        let scheduler = Scheduler::new();
        let document = MemoryDocument::new(&scheduler);

        let pairs: Vec<(&str, &str)> = attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let element = document.insert_element(tag, &pairs);

        let collection = api.attach(&document.context(), element)?;
        let events = Rc::new(RefCell::new(Vec::new()));
        for ty in [CHANGE, ERROR, NEW_ELEMENT] {
            let sink = Rc::clone(&events);
            collection.on(ty, move |_, event| sink.borrow_mut().push(event_json(event)));
        }

        Ok(Self {
            document,
            element,
            collection,
            events,
        })
    }

    fn settle(&self) {
        self.document.scheduler().run_until_idle();
    }

    fn report(&self) -> CliResult<Json> {
        let binding = self.collection.for_element(self.element)?;

        let options: Map<String, Json> = binding
            .options()
            .snapshot()
            .into_iter()
            .map(|(name, value)| (name, value.map_or(Json::Null, |v| v.to_json())))
            .collect();

        let attributes: Map<String, Json> = self
            .document
            .attributes(self.element)
            .into_iter()
            .map(|(name, value)| (name, Json::String(value)))
            .collect();

        let events = self.events.borrow().clone();

        Ok(json!({
            "element": self.element.to_string(),
            "options": options,
            "attributes": attributes,
            "events": events,
        }))
    }
}

fn load_config(path: Option<&Path>) -> CliResult<ApiConfig> {
    Ok(path.map(ApiConfig::load).transpose()?.unwrap_or_default())
}

fn load_definitions(path: &Path) -> CliResult<Vec<(String, SchemaDefinition)>> {
    if path.is_dir() {
        let mut loader = SchemaLoader::new(path);
        loader.load_all()?;
        return Ok(loader
            .names()
            .filter_map(|name| loader.get(name).map(|d| (name.to_string(), d.clone())))
            .collect());
    }

    let loader = SchemaLoader::new(path.parent().unwrap_or_else(|| Path::new(".")));
    let definition = loader.load_file(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(vec![(name, definition)])
}

fn define_single(schema: &Path, config: Option<&Path>) -> CliResult<HtmlApi> {
    if schema.is_dir() {
        return Err(CliError::invalid_argument(format!(
            "Expected a schema file, got directory '{}'",
            schema.display()
        )));
    }
    let config = load_config(config)?;
    let mut definitions = load_definitions(schema)?;
    let (_, definition) = definitions
        .pop()
        .ok_or_else(|| CliError::schema_error("Schema file is empty"))?;
    Ok(HtmlApi::define_with(definition, config)?)
}

fn parse_pairs(args: &[String]) -> CliResult<Vec<(String, String)>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
            _ => Err(CliError::invalid_argument(format!(
                "Expected NAME=VALUE, got \"{}\"",
                arg
            ))),
        })
        .collect()
}

fn describe(schema: &Schema) -> Json {
    let options: Vec<Json> = schema
        .iter()
        .map(|spec| {
            let types: Vec<&str> = spec.constraints().iter().map(|c| c.name()).collect();
            json!({
                "name": spec.name(),
                "attribute": spec.attribute(),
                "types": types,
                "required": spec.is_required(),
                "nullable": spec.is_nullable(),
                "default": spec.default_value().map(Value::to_json),
            })
        })
        .collect();
    Json::Array(options)
}

fn event_json(event: &ApiEvent) -> Json {
    match event {
        ApiEvent::Change(change) => json!({
            "type": CHANGE,
            "option": change.option,
            "value": change.value.to_json(),
            "oldValue": change.old_value.to_json(),
            "initial": change.initial,
        }),
        ApiEvent::Error(error) => json!({
            "type": ERROR,
            "kind": error.kind.as_str(),
            "option": error.option,
            "value": error.value.as_ref().map(Value::to_json),
            "message": error.message,
        }),
        ApiEvent::NewElement(element) => json!({
            "type": NEW_ELEMENT,
            "element": element.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_schema(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const BUTTON: &str = r#"{
        "count": "Number",
        "label": { "type": "String", "default": "ok" }
    }"#;

    #[test]
    fn test_check_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir, "button.json", BUTTON);

        let data = check(&path, None).unwrap();
        let options = data["schemas"]["button"].as_array().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0]["name"], "count");
        assert_eq!(options[0]["attribute"], "data-count");
        assert_eq!(options[0]["nullable"], true);
        assert_eq!(options[1]["default"], "ok");
    }

    #[test]
    fn test_check_directory() {
        let dir = TempDir::new().unwrap();
        write_schema(&dir, "button.json", BUTTON);
        write_schema(&dir, "toggle.json", r#"{ "on": "Boolean" }"#);

        let data = check(dir.path(), None).unwrap();
        let schemas = data["schemas"].as_object().unwrap();
        assert_eq!(schemas.len(), 2);
        assert!(schemas.contains_key("toggle"));
    }

    #[test]
    fn test_check_reports_invalid_schema() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(
            &dir,
            "bad.json",
            r#"{ "mode": { "type": "String", "required": true, "default": "x" } }"#,
        );

        let err = check(&path, None).unwrap_err();
        assert_eq!(err.code_str(), "ATTRBIND_CLI_SCHEMA_ERROR");
    }

    #[test]
    fn test_decode_reports_values_and_initial_events() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir, "button.json", BUTTON);

        let data = decode(&path, &["data-count=3".to_string()], "button", None).unwrap();
        assert_eq!(data["options"]["count"], json!(3.0));
        assert_eq!(data["options"]["label"], "ok");

        let changes: Vec<_> = data["events"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["type"] == "change")
            .collect();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|e| e["initial"] == true));
    }

    #[test]
    fn test_decode_rejects_invalid_attribute() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir, "button.json", BUTTON);

        let err = decode(&path, &["data-count=abc".to_string()], "div", None).unwrap_err();
        assert_eq!(err.code_str(), "ATTRBIND_CLI_ATTACH_FAILED");
    }

    #[test]
    fn test_encode_writes_attributes() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir, "button.json", BUTTON);

        let data = encode(&path, &["count=5".to_string()], &[], "div", None).unwrap();
        assert_eq!(data["attributes"]["data-count"], "5");
        assert_eq!(data["options"]["count"], json!(5.0));
    }

    #[test]
    fn test_encode_reports_rejected_value() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir, "button.json", BUTTON);

        let data = encode(&path, &["label=5".to_string()], &[], "div", None).unwrap();
        let errors: Vec<_> = data["events"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["type"] == "error")
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["kind"], "invalid-value-js");
        assert_eq!(data["options"]["label"], "ok");
    }

    #[test]
    fn test_encode_rejects_unknown_option() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir, "button.json", BUTTON);

        let err = encode(&path, &["size=1".to_string()], &[], "div", None).unwrap_err();
        assert_eq!(err.code_str(), "ATTRBIND_CLI_INVALID_ARGUMENT");
    }

    #[test]
    fn test_parse_pairs_requires_separator() {
        assert!(parse_pairs(&["data-x".to_string()]).is_err());
        let pairs = parse_pairs(&["data-x=a=b".to_string()]).unwrap();
        assert_eq!(pairs, vec![("data-x".to_string(), "a=b".to_string())]);
    }
}
