//! Known web frameworks and where their builds land

use serde::Serialize;

/// Build defaults for one framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameworkPreset {
    pub framework: &'static str,
    pub build_command: &'static str,
    pub web_dir: &'static str,
}

const PRESETS: &[FrameworkPreset] = &[
    FrameworkPreset {
        framework: "vite",
        build_command: "npm run build",
        web_dir: "dist",
    },
    FrameworkPreset {
        framework: "react",
        build_command: "npm run build",
        web_dir: "build",
    },
    FrameworkPreset {
        framework: "next",
        build_command: "npx next build",
        web_dir: "out",
    },
    FrameworkPreset {
        framework: "nuxt",
        build_command: "npx nuxi generate",
        web_dir: ".output/public",
    },
    FrameworkPreset {
        framework: "sveltekit",
        build_command: "npm run build",
        web_dir: "build",
    },
    FrameworkPreset {
        framework: "angular",
        build_command: "npx ng build",
        web_dir: "dist",
    },
    FrameworkPreset {
        framework: "static",
        build_command: "true",
        web_dir: "public",
    },
];

/// Preset for a framework tag; `nextjs` and `svelte` are accepted aliases
pub fn preset(framework: &str) -> Option<FrameworkPreset> {
    let key = match framework.trim().to_ascii_lowercase().as_str() {
        "nextjs" => "next".to_string(),
        "svelte" => "sveltekit".to_string(),
        other => other.to_string(),
    };
    PRESETS.iter().find(|p| p.framework == key).copied()
}

/// Every known framework tag
pub fn frameworks() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|p| p.framework)
}
