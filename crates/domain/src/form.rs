use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use januscope_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::theme::ThemeColors;
use crate::validation_rule::ValidationRules;
use crate::visibility::{VisibilityCondition, one_or_many};

/// Current form values keyed by field id. A missing key means "no value".
pub type FormValues = BTreeMap<String, Value>;

/// Current validation messages keyed by field id.
pub type FormErrors = BTreeMap<String, String>;

/// Input control kind declared by a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// Single-line text input.
    Text,
    /// Masked text input.
    Password,
    /// Multi-line text input.
    Textarea,
    /// Single choice dropdown.
    Select,
    /// Multiple choice checkbox group.
    Multiselect,
    /// Single choice radio group.
    Radio,
    /// Single boolean checkbox.
    Checkbox,
    /// Boolean toggle.
    Switch,
    /// Numeric input.
    Number,
    /// Calendar date input.
    Date,
    /// File picker.
    File,
    /// A kind no control exists for. Kept so authoring mistakes stay visible.
    Unrecognized(String),
}

impl RendererKind {
    /// Every renderer kind with a standard control.
    pub const STANDARD: [RendererKind; 11] = [
        Self::Text,
        Self::Password,
        Self::Textarea,
        Self::Select,
        Self::Multiselect,
        Self::Radio,
        Self::Checkbox,
        Self::Switch,
        Self::Number,
        Self::Date,
        Self::File,
    ];

    /// Returns stable schema value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Switch => "switch",
            Self::Number => "number",
            Self::Date => "date",
            Self::File => "file",
            Self::Unrecognized(kind) => kind.as_str(),
        }
    }

    /// Returns whether this kind names a standard control.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl FromStr for RendererKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "text" => Self::Text,
            "password" => Self::Password,
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "multiselect" => Self::Multiselect,
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            "switch" => Self::Switch,
            "number" => Self::Number,
            "date" => Self::Date,
            "file" => Self::File,
            other => Self::Unrecognized(other.to_owned()),
        })
    }
}

impl Display for RendererKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RendererKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// HTML input type used by text fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// Plain text.
    #[default]
    Text,
    /// E-mail address.
    Email,
    /// Masked password.
    Password,
    /// Telephone number.
    Tel,
    /// URL.
    Url,
}

impl InputType {
    /// Returns the HTML attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Tel => "tel",
            Self::Url => "url",
        }
    }
}

/// One choice offered by select, multiselect and radio controls.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    /// Display text.
    pub label: String,
    /// Stored value.
    pub value: Value,
}

impl SelectOption {
    /// Creates an option.
    #[must_use]
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl<'de> Deserialize<'de> for SelectOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OptionDocument {
            Plain(String),
            Labelled { label: String, value: Value },
        }

        Ok(match OptionDocument::deserialize(deserializer)? {
            OptionDocument::Plain(text) => Self::new(text.clone(), Value::String(text)),
            OptionDocument::Labelled { label, value } => Self::new(label, value),
        })
    }
}

/// Renderer-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldProps {
    /// Choices for select, multiselect and radio controls.
    #[serde(alias = "data")]
    pub options: Vec<SelectOption>,
    /// Whether the choice list can be filtered.
    pub searchable: bool,
    /// Maximum number of chosen values.
    pub max_values: Option<usize>,
    /// Visible rows of a textarea.
    pub min_rows: Option<u16>,
    /// Maximum rows a textarea grows to.
    pub max_rows: Option<u16>,
    /// Numeric input lower bound.
    pub min: Option<f64>,
    /// Numeric input upper bound.
    pub max: Option<f64>,
    /// Numeric input step.
    pub step: Option<f64>,
    /// Decimal places shown.
    pub precision: Option<u8>,
    /// Text shown after a number.
    pub suffix: Option<String>,
    /// Text shown before a number.
    pub prefix: Option<String>,
    /// Thousands separator of a number.
    pub thousands_separator: Option<String>,
    /// Accepted file types.
    pub accept: Option<String>,
    /// Maximum accepted file size in bytes.
    pub max_size: Option<u64>,
    /// Earliest selectable date.
    pub min_date: Option<NaiveDate>,
    /// Latest selectable date.
    pub max_date: Option<NaiveDate>,
    /// Placeholder overriding the field placeholder.
    pub placeholder: Option<String>,
    /// Browser autocomplete hint.
    pub auto_complete: Option<String>,
}

/// Static definition of one form field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    id: NonEmptyString,
    label: String,
    renderer: RendererKind,
    #[serde(default)]
    input_type: InputType,
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(default)]
    default_value: Option<Value>,
    #[serde(default)]
    rules: Option<ValidationRules>,
    #[serde(default)]
    props: FieldProps,
    #[serde(default, deserialize_with = "one_or_many")]
    visible_when: Vec<VisibilityCondition>,
}

impl FieldDefinition {
    /// Creates a validated field definition.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        renderer: RendererKind,
    ) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            label: label.into(),
            renderer,
            input_type: InputType::default(),
            placeholder: None,
            default_value: None,
            rules: None,
            props: FieldProps::default(),
            visible_when: Vec::new(),
        })
    }

    /// Sets the text input type.
    #[must_use]
    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Sets the validation rules.
    #[must_use]
    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Sets renderer-specific configuration.
    #[must_use]
    pub fn with_props(mut self, props: FieldProps) -> Self {
        self.props = props;
        self
    }

    /// Adds a visibility condition. Several conditions must all hold.
    #[must_use]
    pub fn visible_when(mut self, condition: VisibilityCondition) -> Self {
        self.visible_when.push(condition);
        self
    }

    /// Returns field id.
    #[must_use]
    pub fn id(&self) -> &NonEmptyString {
        &self.id
    }

    /// Returns display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns declared renderer kind.
    #[must_use]
    pub fn renderer(&self) -> &RendererKind {
        &self.renderer
    }

    /// Returns text input type.
    #[must_use]
    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    /// Returns placeholder, preferring the renderer-specific one.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.props
            .placeholder
            .as_deref()
            .or(self.placeholder.as_deref())
    }

    /// Returns default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Returns validation rules.
    #[must_use]
    pub fn rules(&self) -> Option<&ValidationRules> {
        self.rules.as_ref()
    }

    /// Returns whether the field carries a required rule.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.rules
            .as_ref()
            .is_some_and(|rules| rules.required_message().is_some())
    }

    /// Returns renderer-specific configuration.
    #[must_use]
    pub fn props(&self) -> &FieldProps {
        &self.props
    }

    /// Returns visibility conditions.
    #[must_use]
    pub fn visibility_conditions(&self) -> &[VisibilityCondition] {
        &self.visible_when
    }
}

/// Spacing between stacked or gridded layout children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// Extra small.
    Xs,
    /// Small.
    Sm,
    /// Medium.
    #[default]
    Md,
    /// Large.
    Lg,
    /// Extra large.
    Xl,
}

impl Spacing {
    /// Returns the CSS class suffix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
        }
    }
}

fn default_grid_cols() -> u8 {
    2
}

/// Presentation tree of a form. Holds no data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutNode {
    /// Leaf placing one field.
    Field {
        /// Referenced field id.
        field_id: String,
        /// Grid columns spanned.
        #[serde(default)]
        col_span: Option<u8>,
    },
    /// Vertical sequence.
    Stack {
        /// Gap between children.
        #[serde(default)]
        spacing: Spacing,
        /// Child nodes.
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
    /// Children arranged in columns.
    Grid {
        /// Column count.
        #[serde(default = "default_grid_cols")]
        cols: u8,
        /// Gap between children.
        #[serde(default)]
        spacing: Spacing,
        /// Child nodes.
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
    /// Titled group of children.
    Section {
        /// Heading.
        #[serde(default)]
        title: Option<String>,
        /// Text under the heading.
        #[serde(default)]
        description: Option<String>,
        /// Whether a divider follows the heading.
        #[serde(default)]
        with_divider: bool,
        /// Whether the section can be collapsed.
        #[serde(default)]
        collapsible: bool,
        /// Child nodes.
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    /// Places one field.
    #[must_use]
    pub fn field(field_id: impl Into<String>) -> Self {
        Self::Field {
            field_id: field_id.into(),
            col_span: None,
        }
    }

    /// Creates a stack with medium spacing.
    #[must_use]
    pub fn stack(children: Vec<LayoutNode>) -> Self {
        Self::Stack {
            spacing: Spacing::default(),
            children,
        }
    }

    /// Creates a grid with medium spacing.
    #[must_use]
    pub fn grid(cols: u8, children: Vec<LayoutNode>) -> Self {
        Self::Grid {
            cols,
            spacing: Spacing::default(),
            children,
        }
    }

    /// Creates a titled, non-collapsible section.
    #[must_use]
    pub fn section(title: impl Into<String>, children: Vec<LayoutNode>) -> Self {
        Self::Section {
            title: Some(title.into()),
            description: None,
            with_divider: false,
            collapsible: false,
            children,
        }
    }

    /// Returns child nodes. Field leaves have none.
    #[must_use]
    pub fn children(&self) -> &[LayoutNode] {
        match self {
            Self::Field { .. } => &[],
            Self::Stack { children, .. }
            | Self::Grid { children, .. }
            | Self::Section { children, .. } => children,
        }
    }

    fn collect_field_ids<'a>(&'a self, output: &mut Vec<&'a str>) {
        if let Self::Field { field_id, .. } = self {
            output.push(field_id.as_str());
        }
        for child in self.children() {
            child.collect_field_ids(output);
        }
    }

    fn validate(&self) -> AppResult<()> {
        if let Self::Grid { cols: 0, .. } = self {
            return Err(AppError::Validation(
                "grid layout nodes need at least one column".to_owned(),
            ));
        }

        self.children().iter().try_for_each(LayoutNode::validate)
    }
}

/// Form header and theme metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormMeta {
    /// Heading.
    pub title: Option<String>,
    /// Sub heading.
    pub subtitle: Option<String>,
    /// Introductory text.
    pub description: Option<String>,
    /// Schema-level colours.
    pub theme: ThemeColors,
}

impl FormMeta {
    /// Creates metadata with a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Authoring mistake found in a form schema that does not block rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// A field declares a renderer kind without a standard control.
    UnknownRenderer {
        /// Field id.
        field_id: String,
        /// Declared kind.
        renderer: String,
    },
    /// A layout leaf references a field that does not exist.
    MissingLayoutField {
        /// Referenced id.
        field_id: String,
    },
    /// A visibility condition references a field that does not exist.
    UnknownVisibilityReference {
        /// Field carrying the condition.
        field_id: String,
        /// Referenced id.
        referenced: String,
    },
}

impl Display for SchemaIssue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRenderer { field_id, renderer } => {
                write!(formatter, "field '{field_id}' uses unknown renderer '{renderer}'")
            }
            Self::MissingLayoutField { field_id } => {
                write!(formatter, "layout references unknown field '{field_id}'")
            }
            Self::UnknownVisibilityReference {
                field_id,
                referenced,
            } => write!(
                formatter,
                "field '{field_id}' is conditioned on unknown field '{referenced}'"
            ),
        }
    }
}

#[derive(Deserialize)]
struct FormSchemaDocument {
    id: String,
    #[serde(default)]
    meta: FormMeta,
    fields: Vec<FieldDefinition>,
    #[serde(default)]
    layout: Vec<LayoutNode>,
}

/// Immutable blueprint of a form, shared by every session created from it.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "FormSchemaDocument")]
pub struct FormSchema {
    id: NonEmptyString,
    meta: FormMeta,
    fields: Vec<FieldDefinition>,
    layout: Vec<LayoutNode>,
}

impl FormSchema {
    /// Creates a validated form schema.
    pub fn new(
        id: impl Into<String>,
        meta: FormMeta,
        fields: Vec<FieldDefinition>,
        layout: Vec<LayoutNode>,
    ) -> AppResult<Self> {
        let mut seen_fields = HashSet::new();
        for field in &fields {
            if !seen_fields.insert(field.id().as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate field id '{}' in form schema",
                    field.id().as_str()
                )));
            }
        }

        for node in &layout {
            node.validate()?;
        }

        Ok(Self {
            id: NonEmptyString::new(id)?,
            meta,
            fields,
            layout,
        })
    }

    /// Returns schema id.
    #[must_use]
    pub fn id(&self) -> &NonEmptyString {
        &self.id
    }

    /// Returns header and theme metadata.
    #[must_use]
    pub fn meta(&self) -> &FormMeta {
        &self.meta
    }

    /// Returns field definitions in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Looks one field up by id.
    #[must_use]
    pub fn field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|field| field.id().as_str() == field_id)
    }

    /// Returns the layout roots.
    #[must_use]
    pub fn layout(&self) -> &[LayoutNode] {
        &self.layout
    }

    /// Collects every configured default value.
    #[must_use]
    pub fn default_values(&self) -> FormValues {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .default_value()
                    .map(|value| (field.id().as_str().to_owned(), value.clone()))
            })
            .collect()
    }

    /// Lists authoring mistakes that are tolerated at render time.
    #[must_use]
    pub fn authoring_issues(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();

        for field in &self.fields {
            if let RendererKind::Unrecognized(renderer) = field.renderer() {
                issues.push(SchemaIssue::UnknownRenderer {
                    field_id: field.id().as_str().to_owned(),
                    renderer: renderer.clone(),
                });
            }

            for condition in field.visibility_conditions() {
                if self.field(condition.field().as_str()).is_none() {
                    issues.push(SchemaIssue::UnknownVisibilityReference {
                        field_id: field.id().as_str().to_owned(),
                        referenced: condition.field().as_str().to_owned(),
                    });
                }
            }
        }

        let mut layout_field_ids = Vec::new();
        for node in &self.layout {
            node.collect_field_ids(&mut layout_field_ids);
        }
        for field_id in layout_field_ids {
            if self.field(field_id).is_none() {
                issues.push(SchemaIssue::MissingLayoutField {
                    field_id: field_id.to_owned(),
                });
            }
        }

        issues
    }
}

impl TryFrom<FormSchemaDocument> for FormSchema {
    type Error = AppError;

    fn try_from(document: FormSchemaDocument) -> Result<Self, Self::Error> {
        Self::new(document.id, document.meta, document.fields, document.layout)
    }
}
