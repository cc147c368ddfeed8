use std::collections::HashMap;

use globset::{Glob, GlobMatcher};

use crate::config::ProjectConfig;
use crate::diagnostics::{
    CodeDiagnostic, ConfigurationDiagnostic, Diagnostic, DiagnosticDetails, FileChecker,
    Result as DiagnosticResult,
};
use crate::modules::{ModuleNode, ModuleTree};
use crate::processors::file_module::FileModule;
use crate::processors::import::NormalizedImport;

fn is_top_level_module_import(mod_path: &str, module: &ModuleNode) -> bool {
    mod_path == module.full_path
}

fn import_matches_interface_members(mod_path: &str, module: &ModuleNode) -> bool {
    let mod_path_segments: Vec<&str> = mod_path.rsplitn(2, '.').collect();

    if mod_path_segments.len() == 1 {
        // Without a '.', compare the whole path with the module's full path.
        mod_path_segments[0] == module.full_path
    } else {
        // With a '.', split into package path and member name.
        let mod_pkg_path = mod_path_segments[1];
        let mod_member_name = mod_path_segments[0];

        mod_pkg_path == module.full_path
            && module
                .interface_members
                .contains(&mod_member_name.to_string())
    }
}

/// The per-import decision procedure.
///
/// Checks run in a fixed order and the first failure wins: interface,
/// visibility, declared dependency, layer ordering. A dependency satisfied
/// only by a deprecated declaration warns without failing.
pub struct ImportChecker<'a> {
    project_config: &'a ProjectConfig,
    module_tree: &'a ModuleTree,
    visibility_matchers: HashMap<String, Vec<GlobMatcher>>,
    check_dependencies: bool,
    check_interfaces: bool,
}

impl<'a> ImportChecker<'a> {
    pub fn try_new(
        project_config: &'a ProjectConfig,
        module_tree: &'a ModuleTree,
        check_dependencies: bool,
        check_interfaces: bool,
    ) -> Result<Self, globset::Error> {
        let mut visibility_matchers = HashMap::new();
        for module in module_tree.iter() {
            let Some(config) = &module.config else {
                continue;
            };
            let matchers: Result<Vec<GlobMatcher>, globset::Error> = config
                .visibility
                .iter()
                .map(|pattern| Ok(Glob::new(pattern)?.compile_matcher()))
                .collect();
            visibility_matchers.insert(config.path.clone(), matchers?);
        }

        Ok(Self {
            project_config,
            module_tree,
            visibility_matchers,
            check_dependencies,
            check_interfaces,
        })
    }

    fn is_visible_to(&self, definition_module: &str, usage_module: &str) -> bool {
        self.visibility_matchers
            .get(definition_module)
            .map(|matchers| {
                matchers
                    .iter()
                    .any(|matcher| matcher.is_match(usage_module))
            })
            .unwrap_or(true)
    }

    fn check_layers(
        &self,
        usage_module: &str,
        usage_layer: &str,
        definition_module: &str,
        definition_layer: &str,
        import: &NormalizedImport,
        file_module: &FileModule,
    ) -> Option<Diagnostic> {
        let layers = &self.project_config.layers;
        let usage_index = layers.iter().position(|layer| layer == usage_layer);
        let definition_index = layers.iter().position(|layer| layer == definition_layer);

        match (usage_index, definition_index) {
            (Some(usage_index), Some(definition_index)) => {
                // Earlier layers are higher and may depend on later ones
                if usage_index <= definition_index {
                    None
                } else {
                    Some(Diagnostic::new_located_error(
                        file_module.relative_file_path().to_path_buf(),
                        import.line_no,
                        DiagnosticDetails::Code(CodeDiagnostic::LayerViolation {
                            dependency: import.module_path.clone(),
                            usage_module: usage_module.to_string(),
                            usage_layer: usage_layer.to_string(),
                            definition_module: definition_module.to_string(),
                            definition_layer: definition_layer.to_string(),
                        }),
                    ))
                }
            }
            (None, _) => Some(Diagnostic::new_global_error(
                DiagnosticDetails::Configuration(ConfigurationDiagnostic::UnknownLayer {
                    layer: usage_layer.to_string(),
                }),
            )),
            (_, None) => Some(Diagnostic::new_global_error(
                DiagnosticDetails::Configuration(ConfigurationDiagnostic::UnknownLayer {
                    layer: definition_layer.to_string(),
                }),
            )),
        }
    }

    fn check_import(&self, import: &NormalizedImport, file_module: &FileModule) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let Some(import_nearest_module) = self.module_tree.find_nearest(&import.module_path)
        else {
            // External imports are always allowed
            return diagnostics;
        };

        if import_nearest_module.full_path == file_module.module.full_path {
            // Imports within the same module are always allowed
            return diagnostics;
        }

        let Some(import_config) = &import_nearest_module.config else {
            diagnostics.push(Diagnostic::new_global_error(
                DiagnosticDetails::Configuration(ConfigurationDiagnostic::ModuleConfigNotFound {
                    module_path: import_nearest_module.full_path.clone(),
                }),
            ));
            return diagnostics;
        };
        let file_config = file_module.module_config();

        if file_config.is_unchecked() {
            return diagnostics;
        }

        let relative_file_path = file_module.relative_file_path().to_path_buf();

        if self.check_interfaces {
            if import_config.strict
                && !is_top_level_module_import(&import.module_path, &import_nearest_module)
                && !import_matches_interface_members(&import.module_path, &import_nearest_module)
            {
                // In strict mode, imports must name the module itself or one
                // of its declared interface members
                diagnostics.push(Diagnostic::new_located_error(
                    relative_file_path,
                    import.line_no,
                    DiagnosticDetails::Code(CodeDiagnostic::PrivateDependency {
                        dependency: import.module_path.clone(),
                        usage_module: file_config.path.clone(),
                        definition_module: import_config.path.clone(),
                    }),
                ));
                return diagnostics;
            }

            if !self.is_visible_to(&import_config.path, &file_config.path) {
                diagnostics.push(Diagnostic::new_located_error(
                    relative_file_path,
                    import.line_no,
                    DiagnosticDetails::Code(CodeDiagnostic::InvisibleDependency {
                        dependency: import.module_path.clone(),
                        usage_module: file_config.path.clone(),
                        definition_module: import_config.path.clone(),
                        visibility: import_config.visibility.clone(),
                    }),
                ));
                return diagnostics;
            }
        }

        if self.check_dependencies {
            match file_config
                .dependencies_iter()
                .find(|dependency| dependency.path == import_config.path)
            {
                Some(dependency) if dependency.deprecated => {
                    // Deprecated dependencies satisfy the check but warn
                    diagnostics.push(Diagnostic::new_located_warning(
                        relative_file_path,
                        import.line_no,
                        DiagnosticDetails::Code(CodeDiagnostic::DeprecatedDependency {
                            dependency: import.module_path.clone(),
                            usage_module: file_config.path.clone(),
                            definition_module: import_config.path.clone(),
                        }),
                    ));
                }
                Some(_) => {}
                None => {
                    diagnostics.push(Diagnostic::new_located_error(
                        relative_file_path,
                        import.line_no,
                        DiagnosticDetails::Code(CodeDiagnostic::UndeclaredDependency {
                            dependency: import.module_path.clone(),
                            usage_module: file_config.path.clone(),
                            definition_module: import_config.path.clone(),
                            allowed: file_config
                                .dependencies_iter()
                                .map(|dependency| dependency.path.clone())
                                .collect(),
                        }),
                    ));
                    return diagnostics;
                }
            }

            if let (Some(usage_layer), Some(definition_layer)) =
                (&file_config.layer, &import_config.layer)
            {
                if let Some(diagnostic) = self.check_layers(
                    &file_config.path,
                    usage_layer,
                    &import_config.path,
                    definition_layer,
                    import,
                    file_module,
                ) {
                    diagnostics.push(diagnostic);
                }
            }
        }

        diagnostics
    }
}

impl<'a> FileChecker<'a> for ImportChecker<'a> {
    type ProcessedFile = FileModule;
    type Output = Vec<Diagnostic>;

    fn check(&'a self, processed_file: &Self::ProcessedFile) -> DiagnosticResult<Self::Output> {
        let mut diagnostics = Vec::new();
        for import in &processed_file.imports {
            diagnostics.extend(self.check_import(import, processed_file));
        }
        Ok(diagnostics)
    }
}
