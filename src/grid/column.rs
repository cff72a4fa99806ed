use super::formatters::Formatter;
use super::resolver::{resolve, resolve_formatted, FormatterBinding, KeyPath};
use super::{ColumnDescriptor, ConfigError, Renderable};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellType {
    Label,
    ColorCircle,
}

/// Either a bare formatter name or `{name, args}` with extra key paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatterSpec {
    Named(String),
    WithArgs {
        name: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellConfig {
    #[serde(rename = "type")]
    pub cell_type: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
    pub value_accessor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<FormatterSpec>,
}

/// A column as declared in configuration: an optional group style and the
/// cells stacked inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
    pub cells: Vec<CellConfig>,
}

#[derive(Deserialize)]
struct ColumnsFile {
    columns: Vec<ColumnConfig>,
}

/// Parse a `{"columns": [...]}` document.
pub fn parse_columns(json: &str) -> Result<Vec<ColumnConfig>, ConfigError> {
    let file: ColumnsFile = serde_json::from_str(json)?;
    Ok(file.columns)
}

/// Validated cell definition: key paths parsed and formatter looked up.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDef {
    pub cell_type: CellType,
    pub style: Option<String>,
    pub value: KeyPath,
    pub formatter: Option<FormatterBinding>,
}

impl CellDef {
    pub fn from_config(cfg: &CellConfig) -> Result<Self, ConfigError> {
        let value = KeyPath::parse(&cfg.value_accessor)?;
        let formatter = match &cfg.formatter {
            None => None,
            Some(FormatterSpec::Named(name)) => {
                Some(FormatterBinding::new(Formatter::from_name(name)?))
            }
            Some(FormatterSpec::WithArgs { name, args }) => {
                let args = args
                    .iter()
                    .map(|a| KeyPath::parse(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(FormatterBinding::with_args(Formatter::from_name(name)?, args))
            }
        };
        Ok(Self {
            cell_type: cfg.cell_type,
            style: cfg.styles.clone(),
            value,
            formatter,
        })
    }

    pub fn render(&self, record: &Value) -> Renderable {
        match self.cell_type {
            CellType::Label => Renderable::Label {
                text: resolve_formatted(record, &self.value, self.formatter.as_ref()),
                style: self.style.clone(),
            },
            CellType::ColorCircle => Renderable::ColorCircle {
                color: resolve(record, &self.value)
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        }
    }
}

/// Build the descriptor for one declared column. All cells are validated
/// up front so a bad formatter name fails here rather than when drawn.
pub fn build_column(index: usize, cfg: &ColumnConfig) -> Result<ColumnDescriptor, ConfigError> {
    let cells = cfg
        .cells
        .iter()
        .map(CellDef::from_config)
        .collect::<Result<Vec<_>, _>>()?;
    let group_style = cfg.styles.clone();
    Ok(ColumnDescriptor::new(
        format!("column_{index}"),
        cfg.styles.clone(),
        move |record| Renderable::Group {
            style: group_style.clone(),
            items: cells.iter().map(|cell| cell.render(record)).collect(),
        },
    ))
}

pub fn build_columns(configs: &[ColumnConfig]) -> Result<Vec<ColumnDescriptor>, ConfigError> {
    configs
        .iter()
        .enumerate()
        .map(|(i, cfg)| build_column(i, cfg))
        .collect()
}
