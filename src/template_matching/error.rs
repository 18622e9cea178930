use thiserror::Error;

/// Why a search produced no score. These are policy outcomes, not faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(
        "Template {template_width}x{template_height} does not fit inside screen {screen_width}x{screen_height}"
    )]
    DegenerateGeometry {
        template_width: u32,
        template_height: u32,
        screen_width: u32,
        screen_height: u32,
    },

    #[error("Template has zero variance ({width}x{height}); correlation is undefined")]
    DegenerateTemplate { width: u32, height: u32 },
}
