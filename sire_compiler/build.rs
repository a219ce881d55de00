// build.rs - TOML-driven compile-time constant generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    lexical: LexicalLimits,
    syntax: SyntaxLimits,
    diagnostics: DiagnosticLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    context_buffer_size: usize,
    max_name_length: usize,
    max_string_length: usize,
}

#[derive(serde::Deserialize)]
struct SyntaxLimits {
    max_nesting_depth: usize,
}

#[derive(serde::Deserialize)]
struct DiagnosticLimits {
    max_errors: usize,
    context_width: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SIRE_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=SIRE_CONFIG_DIR");

    let profile = env::var("SIRE_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("SIRE_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the sire_compiler directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_NESTING_DEPTH: usize = 4096;
    const ABSOLUTE_MAX_NAME_LENGTH: usize = 65_536;

    // The lexer indexes its context ring with a mask
    if !config.lexical.context_buffer_size.is_power_of_two() {
        panic!("LIMITS: lexical.context_buffer_size must be a power of two");
    }

    if config.lexical.max_name_length == 0
        || config.lexical.max_name_length > ABSOLUTE_MAX_NAME_LENGTH
    {
        panic!("LIMITS: lexical.max_name_length out of range");
    }

    if config.syntax.max_nesting_depth == 0
        || config.syntax.max_nesting_depth > ABSOLUTE_MAX_NESTING_DEPTH
    {
        panic!("LIMITS: syntax.max_nesting_depth out of range");
    }

    if config.diagnostics.max_errors == 0 {
        panic!("LIMITS: diagnostics.max_errors must be at least 1");
    }

    if config.diagnostics.context_width > config.lexical.context_buffer_size {
        panic!("LIMITS: diagnostics.context_width exceeds lexical.context_buffer_size");
    }

    if profile == "production" && config.syntax.max_nesting_depth > 512 {
        panic!("PRODUCTION: syntax.max_nesting_depth too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod lexical {{
        pub const CONTEXT_BUFFER_SIZE: usize = {};
        pub const MAX_NAME_LENGTH: usize = {};
        pub const MAX_STRING_LENGTH: usize = {};
    }}

    pub mod syntax {{
        pub const MAX_NESTING_DEPTH: usize = {};
    }}

    pub mod diagnostics {{
        pub const MAX_ERRORS: usize = {};
        pub const CONTEXT_WIDTH: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.lexical.context_buffer_size,
        config.lexical.max_name_length,
        config.lexical.max_string_length,
        config.syntax.max_nesting_depth,
        config.diagnostics.max_errors,
        config.diagnostics.context_width,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
