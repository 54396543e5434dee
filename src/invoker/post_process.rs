use crate::context::ContainerResponse;
use crate::model::HandlingMethod;

/// Adjust a dispatched response before it is written.
///
/// - handler markers go in front of the entity's own markers, or become the
///   entity's markers when it has none
/// - an entity whose type is not fully parameterized takes the handler's declared
///   response type, when that type is meaningful (neither void nor the raw
///   response wrapper)
///
/// An absent response passes through.
#[must_use]
pub fn post_process(
    method: &HandlingMethod,
    response: Option<ContainerResponse>,
) -> Option<ContainerResponse> {
    let mut response = response?;

    let declared = method.markers();
    if !declared.is_empty() {
        let existing = response.entity_markers();
        let merged = if existing.is_empty() {
            declared.to_vec()
        } else {
            declared.iter().chain(existing).cloned().collect()
        };
        response.set_entity_markers(merged);
    }

    let declared_type = method.response_type();
    if response.has_entity()
        && !response.entity_type().is_parameterized()
        && declared_type.is_meaningful()
    {
        response.set_entity_type(declared_type.clone());
    }

    Some(response)
}
