//! Precondition validation for the set and list operations.
//!
//! All checks run before any mutation or key-service call. The `local`
//! stage and `all` region sentinels bypass structural existence checks by
//! convention.

use crate::core::project::ProjectConfig;
use crate::core::resolver::Selection;
use crate::core::scope::{RegionSel, ScopeId, StageSel};
use crate::error::{Result, ValidationError};

/// Target scope type for a set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Common,
    Stage,
    Region,
}

impl ScopeKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "common" => Ok(ScopeKind::Common),
            "stage" => Ok(ScopeKind::Stage),
            "region" => Ok(ScopeKind::Region),
            other => Err(ValidationError::InvalidType(other.to_string()).into()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScopeKind::Common => "common",
            ScopeKind::Stage => "stage",
            ScopeKind::Region => "region",
        }
    }
}

/// A fully-collected set request, before validation.
#[derive(Debug, Clone)]
pub struct SetRequest {
    pub kind: ScopeKind,
    pub stage: Option<String>,
    pub region: Option<String>,
    pub key: String,
    pub value: String,
    pub encrypt: bool,
}

/// Validate a set request and return the target scope.
pub fn validate_set(project: &ProjectConfig, req: &SetRequest) -> Result<ScopeId> {
    if req.key.is_empty() {
        return Err(ValidationError::EmptyKey.into());
    }
    if req.key.starts_with('_') {
        return Err(ValidationError::ReservedKey(req.key.clone()).into());
    }
    if req.value.is_empty() {
        return Err(ValidationError::MissingValue.into());
    }

    match req.kind {
        ScopeKind::Common => Ok(ScopeId::Common),
        ScopeKind::Stage => {
            let stage = validated_stage(project, req.stage.as_deref(), "stage")?;
            Ok(ScopeId::Stage(stage.name().to_string()))
        }
        ScopeKind::Region => {
            let stage = validated_stage(project, req.stage.as_deref(), "region")?;
            let region = req
                .region
                .as_deref()
                .ok_or(ValidationError::MissingRegion)?;
            let region = RegionSel::parse(region);
            // skipped when stage is `local` or region is `all`
            if !stage.is_local() && !region.is_all()
                && !project.region_exists(stage.name(), region.name())
            {
                return Err(ValidationError::UnknownRegion {
                    stage: stage.name().to_string(),
                    region: region.name().to_string(),
                }
                .into());
            }
            Ok(ScopeId::Region {
                stage: stage.name().to_string(),
                region: region.name().to_string(),
            })
        }
    }
}

/// Validate list options and return the resolver selection.
///
/// Non-interactive listing requires either `--all` or both stage and
/// region (the region may be the `all` sentinel).
pub fn validate_list(
    project: &ProjectConfig,
    stage: Option<&str>,
    region: Option<&str>,
    all: bool,
) -> Result<Selection> {
    if all {
        return Ok(Selection::All);
    }
    let (Some(stage), Some(region)) = (stage, region) else {
        return Err(ValidationError::MissingSelection.into());
    };

    let stage = StageSel::parse(stage);
    if !stage.is_local() && !project.stage_exists(stage.name()) {
        return Err(ValidationError::UnknownStage(stage.name().to_string()).into());
    }

    let region = RegionSel::parse(region);
    if !stage.is_local() && !region.is_all()
        && !project.region_exists(stage.name(), region.name())
    {
        return Err(ValidationError::UnknownRegion {
            stage: stage.name().to_string(),
            region: region.name().to_string(),
        }
        .into());
    }

    Ok(Selection::Stage {
        stage: stage.name().to_string(),
        region: match region {
            RegionSel::All => None,
            RegionSel::Named(name) => Some(name),
        },
    })
}

fn validated_stage(
    project: &ProjectConfig,
    stage: Option<&str>,
    kind: &'static str,
) -> Result<StageSel> {
    let stage = stage.ok_or(ValidationError::MissingStage(kind))?;
    let sel = StageSel::parse(stage);
    if !sel.is_local() && !project.stage_exists(sel.name()) {
        return Err(ValidationError::UnknownStage(sel.name().to_string()).into());
    }
    Ok(sel)
}
