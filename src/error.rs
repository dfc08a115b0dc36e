use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Everything that can be wrong with an instance file
#[derive(Error, Debug, Diagnostic)]
pub enum InstanceError {
    #[error("A grid of wall-fenced rows is needed before anything else")]
    EmptyInstance {
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("The grid needs a top wall, a bottom wall and at least one row in between")]
    GridTooSmall {
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("This row is {found} characters wide, the grid demands {expected}")]
    RaggedRow {
        #[source_code]
        src: NamedSource<String>,
        expected: usize,
        found: usize,
        #[label("this row")]
        row: SourceSpan,
    },

    #[error("Grid rows must begin and end with a wall (#)")]
    UnfencedRow {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected '#' here")]
        highlight: SourceSpan,
    },

    #[error("Missing 'charge <N>' line after the grid")]
    MissingCharge {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected the charge here")]
        highlight: SourceSpan,
    },

    #[error("Missing 'packages' line after the charge")]
    MissingPackages {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected 'packages' here")]
        highlight: SourceSpan,
    },

    #[error("Malformed delivery, expected '<id> <pickup> <dropoff>'")]
    MalformedDelivery {
        #[source_code]
        src: NamedSource<String>,
        #[label("this line")]
        highlight: SourceSpan,
    },

    #[error("Shelf letters must be unique")]
    DuplicateShelf {
        #[source_code]
        src: NamedSource<String>,
        #[label("first")]
        a: SourceSpan,
        #[label("second")]
        b: SourceSpan,
    },

    #[error("Robot ids must be unique")]
    DuplicateRobot {
        #[source_code]
        src: NamedSource<String>,
        #[label("first")]
        a: SourceSpan,
        #[label("second")]
        b: SourceSpan,
    },

    #[error("No shelf named '{shelf}' defined")]
    NoSuchShelf {
        #[source_code]
        src: NamedSource<String>,
        shelf: char,
        #[label("referenced here")]
        highlight: SourceSpan,
    },
}

/// Planning-level failures. These are part of the normal protocol: they are
/// printed to stdout and the program still exits successfully.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    #[error("No solution")]
    NoSolution,

    #[error("Not all robots could evade into the idle tail")]
    Evasion,
}
