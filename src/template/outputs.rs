//! Output bindings

use super::params::Parameters;
use super::{RecordNames, Template};
use crate::resource::Output;

pub(super) fn assemble(params: &Parameters, names: &RecordNames) -> Vec<Output> {
    let mut outputs = Vec::new();

    if params.template == Template::Scoped {
        outputs.push(Output::literal("project_id", params.project_id.as_str()));
    }

    outputs.push(Output::reference("subscription_id", names.subscription, "name"));
    outputs.push(Output::reference(
        "poller_private_key_base64",
        names.poller_key,
        "privateKeyData",
    ));

    outputs
}
