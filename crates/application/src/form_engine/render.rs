use std::fmt::Write as _;

use januscope_domain::{HOVER_DARKEN_AMOUNT, LayoutNode, Rgb, ThemeColors, darken_hex};

use super::session::FormSession;
use crate::renderer_registry::{FieldRenderContext, RendererRegistry, escape_html};

/// CSS custom properties derived from resolved form colours.
#[must_use]
pub fn theme_variables(colors: &ThemeColors) -> Vec<(&'static str, String)> {
    let mut variables = Vec::new();

    if let Some(primary) = colors.primary.as_deref() {
        variables.push(("--form-primary", primary.to_owned()));
        variables.push((
            "--form-primary-hover",
            darken_hex(primary, HOVER_DARKEN_AMOUNT),
        ));
        variables.push(("--form-border-focus", primary.to_owned()));
        if let Some(rgb) = Rgb::parse_hex(primary) {
            variables.push(("--form-primary-light", rgb.rgba(0.1)));
        }
    }

    if let Some(secondary) = colors.secondary.as_deref() {
        variables.push(("--form-text-secondary", secondary.to_owned()));
        if let Some(rgb) = Rgb::parse_hex(secondary) {
            variables.push(("--form-bg-secondary", rgb.rgba(0.05)));
        }
    }

    variables
}

impl FormSession {
    /// Renders the whole form: header, layout, submit error and optional footer.
    ///
    /// Fields that are hidden or missing from the field list are skipped.
    /// Each field goes through the registry's failure boundary.
    #[must_use]
    pub fn render(&self, registry: &RendererRegistry, with_submit: bool) -> String {
        let variables = theme_variables(&self.theme());
        let mut html = if variables.is_empty() {
            String::from(r#"<form class="form-engine" novalidate>"#)
        } else {
            let style = variables
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                r#"<form class="form-engine form-themed" style="{}" novalidate>"#,
                escape_html(&style)
            )
        };

        self.render_header(&mut html);

        for (index, node) in self.schema().layout().iter().enumerate() {
            self.render_node(registry, node, &index.to_string(), &mut html);
        }

        if let Some(message) = self.submit_error() {
            let _ = write!(
                html,
                r#"<div class="form-submit-error" role="alert">{}</div>"#,
                escape_html(message)
            );
        }

        if with_submit {
            self.render_footer(&mut html);
        }

        html.push_str("</form>");
        html
    }

    fn render_header(&self, html: &mut String) {
        let meta = self.schema().meta();
        let Some(title) = meta.title.as_deref() else {
            return;
        };

        html.push_str(r#"<div class="form-header">"#);
        let _ = write!(html, r#"<h2 class="form-title">{}</h2>"#, escape_html(title));
        if let Some(subtitle) = meta.subtitle.as_deref() {
            let _ = write!(html, r#"<h3 class="form-subtitle">{}</h3>"#, escape_html(subtitle));
        }
        if let Some(description) = meta.description.as_deref() {
            let _ = write!(
                html,
                r#"<p class="form-description">{}</p>"#,
                escape_html(description)
            );
        }
        html.push_str("</div>");
    }

    fn render_node(
        &self,
        registry: &RendererRegistry,
        node: &LayoutNode,
        path: &str,
        html: &mut String,
    ) {
        match node {
            LayoutNode::Field { field_id, col_span } => {
                let Some(field) = self.schema().field(field_id) else {
                    return;
                };
                if !self.is_visible(field_id) {
                    return;
                }

                let context = FieldRenderContext {
                    field,
                    value: self.value(field_id),
                    error: self.visible_error(field_id),
                    ui: self.ui_state(field_id),
                };
                let _ = write!(
                    html,
                    r#"<div class="grid-item" style="grid-column: span {}">{}</div>"#,
                    col_span.unwrap_or(1),
                    registry.render_field(&context)
                );
            }
            LayoutNode::Stack { spacing, children } => {
                let _ = write!(
                    html,
                    r#"<div class="layout-stack spacing-{}">"#,
                    spacing.as_str()
                );
                self.render_children(registry, children, path, html);
                html.push_str("</div>");
            }
            LayoutNode::Grid {
                cols,
                spacing,
                children,
            } => {
                let _ = write!(
                    html,
                    r#"<div class="layout-grid spacing-{}" data-cols="{cols}" style="grid-template-columns: repeat({cols}, 1fr)">"#,
                    spacing.as_str()
                );
                self.render_children(registry, children, path, html);
                html.push_str("</div>");
            }
            LayoutNode::Section {
                title,
                description,
                with_divider,
                collapsible,
                children,
            } => {
                let collapsed = *collapsible && self.is_section_collapsed(path);
                html.push_str(r#"<section class="layout-section">"#);

                if title.is_some() || *collapsible {
                    html.push_str(r#"<div class="section-header">"#);
                    if let Some(title) = title.as_deref() {
                        let _ = write!(
                            html,
                            r#"<h3 class="section-title">{}</h3>"#,
                            escape_html(title)
                        );
                    }
                    if *collapsible {
                        let _ = write!(
                            html,
                            r#"<button type="button" class="section-toggle" data-section="{path}" aria-expanded="{}">{}</button>"#,
                            !collapsed,
                            if collapsed { "▶" } else { "▼" }
                        );
                    }
                    html.push_str("</div>");
                }
                if let Some(description) = description.as_deref() {
                    let _ = write!(
                        html,
                        r#"<p class="section-description">{}</p>"#,
                        escape_html(description)
                    );
                }
                if *with_divider {
                    html.push_str(r#"<hr class="section-divider">"#);
                }
                if !collapsed {
                    html.push_str(r#"<div class="section-content">"#);
                    self.render_children(registry, children, path, html);
                    html.push_str("</div>");
                }

                html.push_str("</section>");
            }
        }
    }

    fn render_children(
        &self,
        registry: &RendererRegistry,
        children: &[LayoutNode],
        path: &str,
        html: &mut String,
    ) {
        for (index, child) in children.iter().enumerate() {
            self.render_node(registry, child, &format!("{path}.{index}"), html);
        }
    }

    fn render_footer(&self, html: &mut String) {
        let disabled = !self.is_valid() || self.is_submitting();
        let _ = write!(
            html,
            r#"<div class="form-footer"><button type="submit" class="submit-button"{}>{}</button><p class="required-note"><span class="required">*</span> Required fields</p></div>"#,
            if disabled { " disabled" } else { "" },
            if self.is_submitting() {
                "Submitting..."
            } else {
                "Submit"
            }
        );
    }
}
