use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::Build;

/// File name used when handing an export to the host.
pub const EXPORT_FILE_NAME: &str = "pc-build.txt";

pub fn format_price(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Plain-text build summary.
///
/// Parts keep their stored order. The tax line is `subtotal * tax_rate`,
/// never `total - subtotal`.
pub fn format_build(build: &Build) -> String {
    let mut lines = Vec::with_capacity(build.parts.len() + 6);
    lines.push("PC Build".to_string());
    lines.push("--------".to_string());
    for part in &build.parts {
        lines.push(format!(
            "{}: {} - {}",
            part.category,
            part.name,
            format_price(part.price)
        ));
    }
    lines.push(String::new());
    lines.push(format!("Subtotal: {}", format_price(build.subtotal)));
    lines.push(format!(
        "Tax ({:.2}%): {}",
        build.tax_rate * 100.0,
        format_price(build.tax_amount())
    ));
    lines.push(format!("Total: {}", format_price(build.total)));
    lines.join("\n")
}

/// Write the summary to `<dir>/pc-build.txt` and return the path.
pub async fn export_build(build: &Build, dir: &Path) -> Result<PathBuf, AppError> {
    let path = dir.join(EXPORT_FILE_NAME);
    tokio::fs::write(&path, format_build(build)).await?;
    tracing::info!(path = %path.display(), parts = build.parts.len(), "Build exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BuildPart;

    fn part(category: &str, name: &str, price: f64) -> BuildPart {
        BuildPart {
            id: format!("{category}-{name}"),
            category: category.into(),
            name: name.into(),
            price,
            link: None,
        }
    }

    fn sample_build() -> Build {
        Build {
            id: "b1".into(),
            parts: vec![part("CPU", "X", 300.0)],
            subtotal: 1000.0,
            tax_rate: 0.08,
            total: 1080.0,
        }
    }

    #[test]
    fn test_tax_and_total_lines() {
        let text = format_build(&sample_build());
        assert_eq!(
            text,
            "PC Build\n--------\nCPU: X - $300.00\n\nSubtotal: $1000.00\nTax (8.00%): $80.00\nTotal: $1080.00"
        );
    }

    #[test]
    fn test_empty_build_has_header_and_footer_only() {
        let build = Build {
            id: "b0".into(),
            parts: vec![],
            subtotal: 0.0,
            tax_rate: 0.0725,
            total: 0.0,
        };
        let lines: Vec<_> = format_build(&build).lines().map(String::from).collect();
        assert_eq!(
            lines,
            vec![
                "PC Build",
                "--------",
                "",
                "Subtotal: $0.00",
                "Tax (7.25%): $0.00",
                "Total: $0.00",
            ]
        );
    }

    #[test]
    fn test_total_is_not_recomputed() {
        let mut build = sample_build();
        build.total = 1079.99;
        assert!(format_build(&build).ends_with("Total: $1079.99"));
    }

    #[test]
    fn test_parts_keep_stored_order() {
        let mut build = sample_build();
        build.parts = vec![part("PSU", "Z", 99.5), part("CPU", "X", 300.0)];
        let text = format_build(&build);
        let psu = text.find("PSU: Z - $99.50").unwrap();
        let cpu = text.find("CPU: X - $300.00").unwrap();
        assert!(psu < cpu);
    }

    #[test]
    fn test_format_is_deterministic() {
        let build = sample_build();
        assert_eq!(format_build(&build), format_build(&build.clone()));
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_build(&sample_build(), dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format_build(&sample_build()));
    }

    #[tokio::test]
    async fn test_export_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = export_build(&sample_build(), &missing).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
