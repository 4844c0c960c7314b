//! Built-in schemas of the administration pages.

use januscope_core::{AppError, AppResult};
use serde_json::json;

use crate::form::{FieldDefinition, FieldProps, FormMeta, FormSchema, LayoutNode, RendererKind};
use crate::table::{BadgeColor, ColumnDefinition, ColumnType, TableMeta, TableSchema, TableTheme};
use crate::theme::ThemeColors;
use crate::validation_rule::ValidationRules;

const BRAND_PRIMARY: &str = "#ff6b35";

/// Short names accepted by [`table_schema`].
pub const TABLE_NAMES: [&str; 5] = ["roles", "countries", "branches", "locations", "templates"];

/// Looks a built-in table schema up by short name.
pub fn table_schema(name: &str) -> AppResult<TableSchema> {
    match name {
        "roles" => roles_table(),
        "countries" => countries_table(),
        "branches" => branches_table(),
        "locations" => locations_table(),
        "templates" => templates_table(),
        _ => Err(AppError::NotFound(format!(
            "no table schema named '{name}' (expected one of: {})",
            TABLE_NAMES.join(", ")
        ))),
    }
}

fn admin_meta(title: &str, subtitle: &str) -> TableMeta {
    TableMeta {
        title: Some(title.to_owned()),
        subtitle: Some(subtitle.to_owned()),
        description: None,
        theme: TableTheme {
            colors: ThemeColors::new(Some(BRAND_PRIMARY.to_owned()), None),
            striped_rows: true,
            hover_rows: true,
            ..TableTheme::default()
        },
    }
}

fn column(id: &str, header: &str, column_type: ColumnType) -> AppResult<ColumnDefinition> {
    Ok(ColumnDefinition::new(id, header, id)?.with_type(column_type))
}

fn created_column() -> AppResult<ColumnDefinition> {
    Ok(column("createdAt", "Created", ColumnType::Date)?
        .sortable()
        .with_width("120px"))
}

fn actions_column(key_path: &str) -> AppResult<ColumnDefinition> {
    Ok(ColumnDefinition::new("actions", "Actions", key_path)?
        .with_type(ColumnType::Actions)
        .with_width("150px"))
}

fn active_badge_column() -> AppResult<ColumnDefinition> {
    Ok(column("isActive", "Status", ColumnType::Badge)?
        .sortable()
        .with_badge("true", "Active", BadgeColor::Success)
        .with_badge("false", "Inactive", BadgeColor::Default)
        .with_width("100px"))
}

fn admin_table(
    id: &str,
    meta: TableMeta,
    columns: Vec<ColumnDefinition>,
    key_path: &str,
) -> AppResult<TableSchema> {
    Ok(TableSchema::new(id, meta, columns)?
        .searchable()
        .refreshable()
        .with_row_key(key_path))
}

/// Roles administration table.
pub fn roles_table() -> AppResult<TableSchema> {
    admin_table(
        "roles-table",
        admin_meta("Roles", "Manage user roles and permissions"),
        vec![
            column("roleId", "ID", ColumnType::Number)?
                .sortable()
                .with_width("80px"),
            column("roleName", "Role Name", ColumnType::Text)?
                .sortable()
                .filterable(),
            column("description", "Description", ColumnType::Text)?,
            created_column()?,
            actions_column("roleId")?,
        ],
        "roleId",
    )
}

/// Countries reference data table.
pub fn countries_table() -> AppResult<TableSchema> {
    admin_table(
        "countries-table",
        admin_meta("Countries", "Manage country reference data"),
        vec![
            column("countryCode", "Code", ColumnType::Text)?
                .sortable()
                .with_width("100px"),
            column("name", "Name", ColumnType::Text)?
                .sortable()
                .filterable(),
            created_column()?,
            actions_column("countryCode")?,
        ],
        "countryCode",
    )
}

/// Organisational branches table.
pub fn branches_table() -> AppResult<TableSchema> {
    admin_table(
        "branches-table",
        admin_meta("Branches", "Manage organizational branches"),
        vec![
            column("branchId", "ID", ColumnType::Number)?
                .sortable()
                .with_width("80px"),
            column("name", "Name", ColumnType::Text)?
                .sortable()
                .filterable(),
            column("code", "Code", ColumnType::Text)?
                .sortable()
                .with_width("100px"),
            column("countryName", "Country", ColumnType::Text)?.sortable(),
            column("locationName", "Location", ColumnType::Text)?,
            active_badge_column()?,
            actions_column("branchId")?,
        ],
        "branchId",
    )
}

/// Hierarchical locations table.
pub fn locations_table() -> AppResult<TableSchema> {
    admin_table(
        "locations-table",
        admin_meta("Locations", "Manage hierarchical locations"),
        vec![
            column("locationId", "ID", ColumnType::Number)?
                .sortable()
                .with_width("80px"),
            column("name", "Name", ColumnType::Text)?
                .sortable()
                .filterable(),
            column("locationType", "Type", ColumnType::Badge)?
                .sortable()
                .with_badge("country", "Country", BadgeColor::Info)
                .with_badge("county", "County", BadgeColor::Success)
                .with_badge("city", "City", BadgeColor::Warning)
                .with_badge("site", "Site", BadgeColor::Default)
                .with_width("120px"),
            column("parentName", "Parent", ColumnType::Text)?,
            actions_column("locationId")?,
        ],
        "locationId",
    )
}

/// Notification templates table.
pub fn templates_table() -> AppResult<TableSchema> {
    admin_table(
        "templates-table",
        admin_meta(
            "Notification Templates",
            "Manage email and notification templates",
        ),
        vec![
            column("templateId", "ID", ColumnType::Number)?
                .sortable()
                .with_width("80px"),
            column("name", "Name", ColumnType::Text)?
                .sortable()
                .filterable(),
            column("eventType", "Event Type", ColumnType::Badge)?
                .sortable()
                .with_badge("SERVICE_DOWN", "Service Down", BadgeColor::Danger)
                .with_badge("SERVICE_RECOVERED", "Service Recovered", BadgeColor::Success)
                .with_badge("SSL_EXPIRY_30", "SSL 30 Days", BadgeColor::Warning)
                .with_badge("SSL_EXPIRY_14", "SSL 14 Days", BadgeColor::Warning)
                .with_badge("SSL_EXPIRY_7", "SSL 7 Days", BadgeColor::Danger)
                .with_badge("SSL_EXPIRY_3", "SSL 3 Days", BadgeColor::Danger)
                .with_width("150px"),
            column("channel", "Channel", ColumnType::Badge)?
                .sortable()
                .with_badge("email", "Email", BadgeColor::Info)
                .with_badge("telegram", "Telegram", BadgeColor::Info)
                .with_badge("sms", "SMS", BadgeColor::Info)
                .with_width("100px"),
            active_badge_column()?,
            actions_column("templateId")?,
        ],
        "templateId",
    )
}

fn numeric_props(min: f64, max: f64, step: f64) -> FieldProps {
    FieldProps {
        min: Some(min),
        max: Some(max),
        step: Some(step),
        ..FieldProps::default()
    }
}

/// Create and edit form of a monitored service.
pub fn service_form() -> AppResult<FormSchema> {
    let fields = vec![
        FieldDefinition::new("name", "Service Name", RendererKind::Text)?
            .with_placeholder("e.g., Production API")
            .with_rules(
                ValidationRules::default()
                    .required("Service name is required")
                    .min_length(3, "Name must be at least 3 characters"),
            ),
        FieldDefinition::new("url", "URL", RendererKind::Text)?
            .with_placeholder("e.g., https://api.example.com")
            .with_rules(ValidationRules::default().required("URL is required").pattern(
                "^https?://.+",
                "Please enter a valid URL starting with http:// or https://",
            )?),
        FieldDefinition::new(
            "checkIntervalSeconds",
            "Check Interval (seconds)",
            RendererKind::Number,
        )?
        .with_placeholder("300")
        .with_default(json!(300))
        .with_props(numeric_props(60.0, 3600.0, 60.0))
        .with_rules(
            ValidationRules::default()
                .required("Check interval is required")
                .min(60.0, "Minimum interval is 60 seconds")
                .max(3600.0, "Maximum interval is 3600 seconds"),
        ),
        FieldDefinition::new("timeoutMs", "Timeout (milliseconds)", RendererKind::Number)?
            .with_placeholder("10000")
            .with_default(json!(10000))
            .with_props(numeric_props(1000.0, 60000.0, 1000.0))
            .with_rules(
                ValidationRules::default()
                    .required("Timeout is required")
                    .min(1000.0, "Minimum timeout is 1000ms")
                    .max(60000.0, "Maximum timeout is 60000ms"),
            ),
        FieldDefinition::new("active", "Active", RendererKind::Switch)?.with_default(json!(true)),
    ];

    let layout = vec![
        LayoutNode::field("name"),
        LayoutNode::field("url"),
        LayoutNode::grid(
            2,
            vec![
                LayoutNode::field("checkIntervalSeconds"),
                LayoutNode::field("timeoutMs"),
            ],
        ),
        LayoutNode::field("active"),
    ];

    FormSchema::new(
        "service-form",
        FormMeta::titled("Service Details"),
        fields,
        layout,
    )
}
