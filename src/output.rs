//! CLI output formatting for catalog commands.
//!
//! # Entity Display Contract
//!
//! Every entity follows the same two-level pattern:
//!
//! 1. **Header line**: positional index + name + `[#id]`
//! 2. **Context lines**: indented `Category:`, `Price:`, `Image:`, etc.
//!
//! # Output Format
//!
//! ## Products
//!
//! ```text
//! 001 Oak Chair [#3]
//!     Category: Furniture
//!     Price: 10.00 -> 14.50
//!     Image: image/jpeg, 41.2 KB
//!     Description: Solid oak, hand finished
//! 002 Desk Lamp [#2]
//!     Category: Lighting
//!     Price: 5.00 -> 9.99
//!     Image: none
//!
//! 2 products
//! ```
//!
//! ## Categories
//!
//! ```text
//! 001 Furniture [#1] (2 products)
//! 002 Lighting [#2] (0 products)
//! ```
//!
//! # Architecture
//!
//! Each entity has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. `--json` output bypasses
//! this module and serializes the views directly.

use crate::auth::{IssuedToken, User};
use crate::catalog::{Category, ProductView};
use crate::types::{ImageDisplay, ProductImage};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn entity_header(index: usize, name: &str, id: u64) -> String {
    format!("{} {} [#{}]", format_index(index), name, id)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Human-readable byte count.
fn format_bytes(n: u64) -> String {
    match n {
        0..1024 => format!("{n} B"),
        1024..1_048_576 => format!("{:.1} KB", n as f64 / 1024.0),
        _ => format!("{:.1} MB", n as f64 / 1_048_576.0),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Products
// ============================================================================

fn image_line(view: &ProductView) -> String {
    match (&view.image_mime_type, view.image_size) {
        (Some(mime), Some(size)) => format!("Image: {}, {}", mime, format_bytes(size)),
        _ => "Image: none".to_string(),
    }
}

/// One product: header plus indented detail lines.
pub fn format_product(index: usize, view: &ProductView) -> Vec<String> {
    let pad = indent(1);
    let mut lines = vec![entity_header(index, &view.name, view.id)];
    lines.push(format!(
        "{pad}Category: {}",
        view.category_name
            .clone()
            .unwrap_or_else(|| format!("#{}", view.category_id))
    ));
    lines.push(format!(
        "{pad}Price: {} -> {}",
        view.purchase_price, view.sale_price
    ));
    lines.push(format!("{pad}{}", image_line(view)));
    if let Some(desc) = &view.description {
        lines.push(format!("{pad}Description: {}", truncate_desc(desc, 60)));
    }
    lines
}

/// Full detail for `product show`, including the data URI prefix.
pub fn format_product_detail(view: &ProductView) -> Vec<String> {
    let pad = indent(1);
    let mut lines = format_product(1, view);
    lines.push(format!("{pad}Owner: #{}", view.user_id));
    lines.push(format!("{pad}Created: {}", view.created_at.to_rfc3339()));
    lines.push(format!("{pad}Updated: {}", view.updated_at.to_rfc3339()));
    if let ImageDisplay::DataUri(uri) = &view.image {
        lines.push(format!("{pad}Data URI: {}", truncate_desc(uri, 48)));
    }
    lines
}

pub fn format_product_list(views: &[ProductView]) -> Vec<String> {
    if views.is_empty() {
        return vec!["No products".to_string()];
    }
    let mut lines: Vec<String> = views
        .iter()
        .enumerate()
        .flat_map(|(i, v)| format_product(i + 1, v))
        .collect();
    lines.push(String::new());
    lines.push(plural(views.len(), "product"));
    lines
}

pub fn print_product_detail(view: &ProductView) {
    print_lines(format_product_detail(view));
}

pub fn print_product_list(views: &[ProductView]) {
    print_lines(format_product_list(views));
}

// ============================================================================
// Categories
// ============================================================================

pub fn format_categories(categories: &[Category]) -> Vec<String> {
    if categories.is_empty() {
        return vec!["No categories".to_string()];
    }
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{} ({})",
                entity_header(i + 1, &c.name, c.id),
                plural(c.product_count, "product")
            )
        })
        .collect()
}

pub fn print_categories(categories: &[Category]) {
    print_lines(format_categories(categories));
}

// ============================================================================
// Users and tokens
// ============================================================================

pub fn format_user(user: &User) -> Vec<String> {
    vec![format!("{} <{}> [#{}]", user.name, user.email, user.id)]
}

pub fn print_user(user: &User) {
    print_lines(format_user(user));
}

/// The raw token goes on its own line so it can be captured by scripts.
pub fn format_token(token: &IssuedToken) -> Vec<String> {
    vec![
        token.token.clone(),
        format!("{}Expires: {}", indent(1), token.expires_at.to_rfc3339()),
    ]
}

pub fn print_token(token: &IssuedToken) {
    print_lines(format_token(token));
}

// ============================================================================
// Standalone image encoding
// ============================================================================

/// Summary line for `image encode`: input size against the stored triple.
pub fn format_encoded_image(input_len: usize, image: &ProductImage) -> Vec<String> {
    match image.stored() {
        Some(stored) => vec![format!(
            "{} -> {}, {}",
            format_bytes(input_len as u64),
            stored.mime_type(),
            format_bytes(stored.byte_size())
        )],
        None => vec!["No image".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;
    use chrono::{TimeZone, Utc};

    const SAMPLE_URI: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQAAAQABAAD";

    fn view(id: u64, name: &str, image: Option<u64>) -> ProductView {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ProductView {
            id,
            name: name.to_string(),
            description: None,
            image: match image {
                Some(_) => ImageDisplay::DataUri(SAMPLE_URI.into()),
                None => ImageDisplay::NoImage,
            },
            image_mime_type: image.map(|_| "image/jpeg".to_string()),
            image_size: image,
            category_id: 1,
            category_name: Some("Furniture".to_string()),
            user_id: 7,
            purchase_price: "10".parse::<Price>().unwrap(),
            sale_price: "14.5".parse::<Price>().unwrap(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn truncate_desc_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate_desc(&text, 40), format!("{}...", "a".repeat(40)));
        assert_eq!(truncate_desc("short", 40), "short");
    }

    #[test]
    fn truncate_desc_respects_char_boundaries() {
        assert_eq!(truncate_desc("ééééé", 2), "éé...");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0 MB");
    }

    #[test]
    fn product_lines() {
        let lines = format_product(1, &view(3, "Oak Chair", Some(42_188)));
        assert_eq!(
            lines,
            vec![
                "001 Oak Chair [#3]",
                "    Category: Furniture",
                "    Price: 10.00 -> 14.50",
                "    Image: image/jpeg, 41.2 KB",
            ]
        );
    }

    #[test]
    fn product_without_image() {
        let lines = format_product(2, &view(2, "Desk Lamp", None));
        assert_eq!(lines[3], "    Image: none");
    }

    #[test]
    fn detail_includes_truncated_data_uri() {
        let lines = format_product_detail(&view(3, "Oak Chair", Some(10)));
        let last = lines.last().unwrap();
        assert!(last.starts_with("    Data URI: data:image/jpeg;base64,"));
        assert!(last.ends_with("..."));
    }

    #[test]
    fn product_list_footer() {
        let lines = format_product_list(&[view(2, "B", None), view(1, "A", None)]);
        assert_eq!(lines.last().unwrap(), "2 products");
        assert_eq!(lines[0], "001 B [#2]");
        assert_eq!(format_product_list(&[]), vec!["No products"]);
    }

    #[test]
    fn category_lines() {
        let lines = format_categories(&[
            Category {
                id: 1,
                name: "Furniture".into(),
                product_count: 1,
            },
            Category {
                id: 4,
                name: "Lighting".into(),
                product_count: 0,
            },
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "001 Furniture [#1] (1 product)");
        assert_eq!(lines[1], "002 Lighting [#4] (0 products)");
    }

    #[test]
    fn user_line() {
        let user = User {
            id: 5,
            name: "Ana".into(),
            email: "ana@example.com".into(),
        };
        assert_eq!(format_user(&user), vec!["Ana <ana@example.com> [#5]"]);
    }

    #[test]
    fn encoded_image_summary() {
        assert_eq!(
            format_encoded_image(10, &ProductImage::none()),
            vec!["No image"]
        );
        let image = ProductImage::encoded(vec![0; 2048]);
        assert_eq!(
            format_encoded_image(4096, &image),
            vec!["4.0 KB -> image/jpeg, 2.0 KB"]
        );
    }
}
