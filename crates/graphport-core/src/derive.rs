//! Properties computed from related instances instead of copied verbatim.
//!
//! Each rule is a pure function of the instance and the adapter. A rule
//! returns `Ok(None)` when the related instance it depends on does not
//! exist; the property is then omitted from the node.

use crate::{AttributeValue, PropertyValue, SourceAdapter, SourceError, SourceInstance, SourceResult};

/// Placeholder substituted by the identifier in access URL templates.
pub const URL_ID_PLACEHOLDER: &str = "###ID###";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationRule {
    /// Identifier string held by the referenced StableIdentifier.
    StableIdentifier,
    /// Whether a PathwayDiagram represents this pathway.
    HasDiagram,
    /// Whether a disease is annotated.
    IsInDisease,
    /// Whether the instance was inferred from another one.
    IsInferred,
    /// Display name of the first species.
    SpeciesName,
    /// Access URL of the reference database with the identifier filled in.
    Url,
}

const RULES: &[(&str, DerivationRule)] = &[
    ("stableIdentifier", DerivationRule::StableIdentifier),
    ("hasDiagram", DerivationRule::HasDiagram),
    ("isInDisease", DerivationRule::IsInDisease),
    ("isInferred", DerivationRule::IsInferred),
    ("speciesName", DerivationRule::SpeciesName),
    ("url", DerivationRule::Url),
];

impl DerivationRule {
    /// Rule for an attribute name, if the attribute is derived.
    pub fn for_attribute(attribute: &str) -> Option<Self> {
        RULES.iter().find(|(name, _)| *name == attribute).map(|(_, rule)| *rule)
    }

    /// What was missing when the rule yields nothing.
    pub fn missing(&self) -> &'static str {
        match self {
            Self::StableIdentifier => "no stable identifier",
            Self::HasDiagram => "no pathway diagram",
            Self::IsInDisease => "no disease record",
            Self::IsInferred => "no inferredFrom instance",
            Self::SpeciesName => "no species",
            Self::Url => "no identifier or reference database access url",
        }
    }

    pub fn derive<A: SourceAdapter + ?Sized>(
        &self,
        instance: &SourceInstance,
        adapter: &A,
    ) -> SourceResult<Option<PropertyValue>> {
        match self {
            Self::StableIdentifier => stable_identifier(instance, adapter),
            Self::HasDiagram => has_diagram(instance, adapter),
            Self::IsInDisease => presence_of(instance, adapter, "disease"),
            Self::IsInferred => presence_of(instance, adapter, "inferredFrom"),
            Self::SpeciesName => species_name(instance, adapter),
            Self::Url => url(instance, adapter),
        }
    }
}

fn referenced<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
    attribute: &str,
) -> SourceResult<Option<SourceInstance>> {
    match adapter.get_scalar(instance, attribute)? {
        None => Ok(None),
        Some(AttributeValue::Instance(target)) => Ok(Some(target)),
        Some(_) => Err(SourceError::unexpected(attribute, "instance reference")),
    }
}

fn text<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
    attribute: &str,
) -> SourceResult<Option<String>> {
    match adapter.get_scalar(instance, attribute)? {
        None => Ok(None),
        Some(AttributeValue::Text(s)) => Ok(Some(s)),
        Some(_) => Err(SourceError::unexpected(attribute, "text")),
    }
}

fn stable_identifier<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
) -> SourceResult<Option<PropertyValue>> {
    let Some(st_id) = referenced(instance, adapter, "stableIdentifier")? else {
        return Ok(None);
    };
    let identifier = text(&st_id, adapter, "identifier");
    adapter.release(&st_id);
    Ok(identifier?.map(PropertyValue::Text))
}

fn has_diagram<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
) -> SourceResult<Option<PropertyValue>> {
    let referrers = adapter.get_inverse_relation_targets(instance, "representedPathway")?;
    let found = referrers.iter().any(|r| r.class_name == "PathwayDiagram");
    for referrer in &referrers {
        adapter.release(referrer);
    }
    Ok(found.then_some(PropertyValue::Boolean(true)))
}

fn presence_of<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
    attribute: &str,
) -> SourceResult<Option<PropertyValue>> {
    Ok(referenced(instance, adapter, attribute)?.map(|related| {
        adapter.release(&related);
        PropertyValue::Boolean(true)
    }))
}

fn species_name<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
) -> SourceResult<Option<PropertyValue>> {
    let species = adapter.get_relation_targets(instance, "species")?;
    let name = species
        .first()
        .and_then(|s| s.display_name.clone())
        .map(PropertyValue::Text);
    for s in &species {
        adapter.release(s);
    }
    Ok(name)
}

fn url<A: SourceAdapter + ?Sized>(
    instance: &SourceInstance,
    adapter: &A,
) -> SourceResult<Option<PropertyValue>> {
    let Some(identifier) = text(instance, adapter, "identifier")? else {
        return Ok(None);
    };
    let Some(database) = referenced(instance, adapter, "referenceDatabase")? else {
        return Ok(None);
    };
    let template = text(&database, adapter, "accessUrl");
    adapter.release(&database);
    Ok(template?.map(|t| PropertyValue::Text(t.replace(URL_ID_PLACEHOLDER, &identifier))))
}
