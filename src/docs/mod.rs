//! Converts the demo READMEs into standalone HTML pages.

use std::path::{Path, PathBuf};

mod markdown;
mod template;

pub use markdown::render_markdown;
pub use template::{apply_template, CONTENT_PLACEHOLDER, TITLE_PLACEHOLDER};

pub const TEMPLATE_PATH: &str = "docs/template.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocConversion {
    pub readme_path: PathBuf,
    pub output_path: PathBuf,
    pub title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("{title}: failed to read {}", .path.display())]
    ReadInput {
        title: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{title}: failed to read template {}", .path.display())]
    ReadTemplate {
        title: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{title}: failed to write {}", .path.display())]
    WriteOutput {
        title: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The pages generated for this repository, relative to `root`.
pub fn default_conversions(root: &Path) -> Vec<DocConversion> {
    [
        ("basic-scene", "Basic Scene - A basic 3D scene"),
        ("glb-viewer", "GLB Viewer - 3D model viewer"),
    ]
    .into_iter()
    .map(|(name, title)| DocConversion {
        readme_path: root.join("demos").join(name).join("README.md"),
        output_path: root.join("docs").join(format!("{}.html", name)),
        title: title.to_string(),
    })
    .collect()
}

/// Renders one README into the template and writes the page. Nothing is
/// written unless both the README and the template could be read.
pub fn convert_readme_to_html(
    conversion: &DocConversion,
    template_path: &Path,
) -> Result<PathBuf, DocError> {
    let markdown = std::fs::read_to_string(&conversion.readme_path).map_err(|source| {
        DocError::ReadInput {
            title: conversion.title.clone(),
            path: conversion.readme_path.clone(),
            source,
        }
    })?;

    let content = render_markdown(&markdown);

    let template =
        std::fs::read_to_string(template_path).map_err(|source| DocError::ReadTemplate {
            title: conversion.title.clone(),
            path: template_path.to_path_buf(),
            source,
        })?;

    let page = apply_template(&template, &conversion.title, &content);

    std::fs::write(&conversion.output_path, page).map_err(|source| DocError::WriteOutput {
        title: conversion.title.clone(),
        path: conversion.output_path.clone(),
        source,
    })?;

    Ok(conversion.output_path.clone())
}

/// Runs every conversion, logging failures and carrying on. Returns how many
/// pages were written.
pub fn generate_all(conversions: &[DocConversion], template_path: &Path) -> usize {
    log::info!("Converting README files to HTML...");

    let mut written = 0;
    for conversion in conversions {
        match convert_readme_to_html(conversion, template_path) {
            Ok(path) => {
                log::info!("Generated {}: {}", conversion.title, path.display());
                written += 1;
            }
            Err(e) => log::error!("Conversion failed: {:#}", anyhow::Error::from(e)),
        }
    }

    log::info!("Done, {} of {} pages written", written, conversions.len());
    for conversion in conversions {
        log::info!("  - {}: {}", conversion.title, conversion.output_path.display());
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str =
        "<html><head><title>{{TITLE}}</title></head><body><h1>{{TITLE}}</h1>{{CONTENT}}</body></html>";

    struct Fixture {
        dir: tempfile::TempDir,
        conversion: DocConversion,
        template_path: PathBuf,
    }

    fn fixture(readme: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.html");
        std::fs::write(&template_path, TEMPLATE).unwrap();

        let readme_path = dir.path().join("README.md");
        if let Some(readme) = readme {
            std::fs::write(&readme_path, readme).unwrap();
        }

        let conversion = DocConversion {
            readme_path,
            output_path: dir.path().join("out.html"),
            title: "Sample Page".to_string(),
        };

        Fixture {
            dir,
            conversion,
            template_path,
        }
    }

    #[test]
    fn fills_template() {
        let f = fixture(Some("# Hello\n\nSome *text*."));

        let path = convert_readme_to_html(&f.conversion, &f.template_path).unwrap();
        let page = std::fs::read_to_string(path).unwrap();

        assert_eq!(page.matches("<title>Sample Page</title>").count(), 1);
        assert_eq!(page.matches("<h1>Sample Page</h1>").count(), 1);
        assert_eq!(page.matches("<h1>Hello</h1>").count(), 1);
        assert!(page.contains("<em>text</em>"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn missing_readme_leaves_output_alone() {
        let f = fixture(None);

        let error = convert_readme_to_html(&f.conversion, &f.template_path).unwrap_err();

        assert!(matches!(error, DocError::ReadInput { .. }));
        assert!(error.to_string().contains("Sample Page"));
        assert!(!f.conversion.output_path.exists());
    }

    #[test]
    fn missing_template_leaves_existing_output() {
        let f = fixture(Some("text"));
        std::fs::write(&f.conversion.output_path, "previous").unwrap();

        let error =
            convert_readme_to_html(&f.conversion, &f.dir.path().join("nope.html")).unwrap_err();

        assert!(matches!(error, DocError::ReadTemplate { .. }));
        assert_eq!(
            std::fs::read_to_string(&f.conversion.output_path).unwrap(),
            "previous"
        );
    }

    #[test]
    fn regenerating_is_byte_identical() {
        let f = fixture(Some("| a | b |\n|---|---|\n| 1 | 2 |\nline one\nline two\n"));

        convert_readme_to_html(&f.conversion, &f.template_path).unwrap();
        let first = std::fs::read(&f.conversion.output_path).unwrap();
        convert_readme_to_html(&f.conversion, &f.template_path).unwrap();
        let second = std::fs::read(&f.conversion.output_path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn generate_all_continues_after_failure() {
        let f = fixture(Some("ok"));
        let broken = DocConversion {
            readme_path: f.dir.path().join("missing.md"),
            output_path: f.dir.path().join("missing.html"),
            title: "Broken".to_string(),
        };

        let written = generate_all(&[broken.clone(), f.conversion.clone()], &f.template_path);

        assert_eq!(written, 1);
        assert!(!broken.output_path.exists());
        assert!(f.conversion.output_path.exists());
    }

    #[test]
    fn default_conversions_point_at_demo_readmes() {
        let conversions = default_conversions(Path::new("root"));

        assert_eq!(conversions.len(), 2);
        assert_eq!(
            conversions[0].readme_path,
            Path::new("root/demos/basic-scene/README.md")
        );
        assert_eq!(
            conversions[1].output_path,
            Path::new("root/docs/glb-viewer.html")
        );
        assert_eq!(conversions[1].title, "GLB Viewer - 3D model viewer");
    }
}
