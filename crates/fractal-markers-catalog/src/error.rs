use crate::Unit;

/// Errors raised while building or rescaling a marker set.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(
        "unknown fractal configuration `{0}`; expected one of \
         FRACTAL_2L_6, FRACTAL_3L_6, FRACTAL_4L_6, FRACTAL_5L_6"
    )]
    UnknownConfig(String),

    #[error("malformed catalogue blob: {0}")]
    MalformedBlob(&'static str),

    #[error("marker set is expressed in {0:?}; conversion requires pixel or normalized units")]
    UnitError(Unit),
}
