//! Offline docstring skeletons rendered from the structural model.

use crate::analysis::{FunctionRecord, Parameter};
use crate::generate::{fallback_text, DocStyle};

/// Render a skeleton docstring with one entry per parameter, the return type
/// and raised exceptions, laid out in the given style.
///
/// `self` and `cls` of methods are left out.
pub fn render_skeleton(record: &FunctionRecord, style: DocStyle) -> String {
    let params: Vec<&Parameter> = record
        .parameters
        .iter()
        .enumerate()
        .filter(|(i, p)| !(record.is_method && *i == 0 && matches!(p.name.as_str(), "self" | "cls")))
        .map(|(_, p)| p)
        .collect();
    let returns = record
        .return_type
        .as_deref()
        .filter(|r| *r != "None" && *r != "NoReturn");

    let mut lines = vec![fallback_text(&record.name)];

    if !params.is_empty() {
        lines.push(String::new());
        match style {
            DocStyle::Google => {
                lines.push("Args:".to_string());
                for p in &params {
                    let name = p.display_name();
                    match &p.annotation {
                        Some(ann) => lines.push(format!("    {name} ({ann}): Description of `{}`.", p.name)),
                        None => lines.push(format!("    {name}: Description of `{}`.", p.name)),
                    }
                }
            }
            DocStyle::Numpy => {
                lines.push("Parameters".to_string());
                lines.push("----------".to_string());
                for p in &params {
                    match &p.annotation {
                        Some(ann) => lines.push(format!("{} : {ann}", p.display_name())),
                        None => lines.push(p.display_name()),
                    }
                    lines.push(format!("    Description of `{}`.", p.name));
                }
            }
            DocStyle::Rest => {
                for p in &params {
                    lines.push(format!(":param {}: Description of `{}`.", p.name, p.name));
                    if let Some(ann) = &p.annotation {
                        lines.push(format!(":type {}: {ann}", p.name));
                    }
                }
            }
        }
    }

    if let Some(ret) = returns {
        lines.push(String::new());
        match style {
            DocStyle::Google => {
                lines.push("Returns:".to_string());
                lines.push(format!("    {ret}: Description of the return value."));
            }
            DocStyle::Numpy => {
                lines.push("Returns".to_string());
                lines.push("-------".to_string());
                lines.push(ret.to_string());
                lines.push("    Description of the return value.".to_string());
            }
            DocStyle::Rest => {
                lines.push(":return: Description of the return value.".to_string());
                lines.push(format!(":rtype: {ret}"));
            }
        }
    }

    if !record.raised_exceptions.is_empty() {
        lines.push(String::new());
        match style {
            DocStyle::Google => {
                lines.push("Raises:".to_string());
                for exc in &record.raised_exceptions {
                    lines.push(format!("    {exc}: Description of when it is raised."));
                }
            }
            DocStyle::Numpy => {
                lines.push("Raises".to_string());
                lines.push("------".to_string());
                for exc in &record.raised_exceptions {
                    lines.push(exc.clone());
                    lines.push("    Description of when it is raised.".to_string());
                }
            }
            DocStyle::Rest => {
                for exc in &record.raised_exceptions {
                    lines.push(format!(":raises {exc}: Description of when it is raised."));
                }
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PythonAnalyzer;
    use std::path::Path;

    const SOURCE: &str = r#"
class Account:
    def withdraw(self, amount: int, *, note=None) -> int:
        if amount < 0:
            raise ValueError("negative")
        return amount
"#;

    fn withdraw() -> FunctionRecord {
        PythonAnalyzer::new()
            .unwrap()
            .analyze_source(Path::new("account.py"), SOURCE)
            .unwrap()
            .functions
            .remove(0)
    }

    #[test]
    fn test_google_skeleton() {
        assert_eq!(
            render_skeleton(&withdraw(), DocStyle::Google),
            "Short description of `withdraw`.\n\
             \n\
             Args:\n    \
             amount (int): Description of `amount`.\n    \
             note: Description of `note`.\n\
             \n\
             Returns:\n    \
             int: Description of the return value.\n\
             \n\
             Raises:\n    \
             ValueError: Description of when it is raised."
        );
    }

    #[test]
    fn test_numpy_skeleton_sections() {
        let text = render_skeleton(&withdraw(), DocStyle::Numpy);
        assert!(text.contains("Parameters\n----------\namount : int\n"));
        assert!(text.contains("Returns\n-------\nint\n"));
        assert!(!text.contains("self"));
    }

    #[test]
    fn test_rest_skeleton_fields() {
        let text = render_skeleton(&withdraw(), DocStyle::Rest);
        assert!(text.contains(":param amount: Description of `amount`.\n:type amount: int"));
        assert!(text.contains(":rtype: int"));
        assert!(text.contains(":raises ValueError:"));
    }
}
