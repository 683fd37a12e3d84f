use dora_node_api::{
    dora_core::config::DataId, DoraNode, Event, IntoArrow, MetadataParameters, Parameter,
};
use dora_vlm::{
    input::node_event_from_input,
    smolvlm2::{resolve_weights, SmolVlm2Backend},
    NodeEvent, Outcome, VlmConfig, VlmError, VlmNode,
};

fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = VlmConfig::from_env()?;
    log::debug!("{config:?}");

    if let Some(adapter_path) = &config.adapter_path {
        return Err(VlmError::AdapterUnsupported(adapter_path.clone()).into());
    }

    // load the model once before joining the dataflow
    let weights = resolve_weights(&config.model_name_or_path, config.use_model_hub)?;
    let model = SmolVlm2Backend::new(weights)?;
    let mut vlm = VlmNode::new(&config, model)?;

    let (mut node, mut events) = DoraNode::init_from_env()?;

    let output = DataId::from("text".to_owned());

    while let Some(event) = events.recv() {
        let node_event = match event {
            Event::Input { id, metadata, data } => {
                match node_event_from_input(id.as_str(), &metadata.parameters, &**data) {
                    Ok(Some(node_event)) => node_event,
                    Ok(None) => {
                        log::warn!("Ignoring unexpected input `{id}`");
                        continue;
                    }
                    Err(e) => {
                        log::error!("Rejected input `{id}`: {e}");
                        continue;
                    }
                }
            }
            Event::Error(message) => NodeEvent::Error(message),
            Event::Stop { .. } => {
                log::info!("Received manual stop");
                continue;
            }
            Event::InputClosed { id } => {
                log::info!("Input `{id}` was closed");
                continue;
            }
            other => {
                log::warn!("Received unexpected event: {other:?}");
                continue;
            }
        };

        match vlm.handle(node_event) {
            Ok(Outcome::Responded(answer)) => {
                let mut parameters = MetadataParameters::default();
                parameters.insert("image_id".to_string(), Parameter::String(answer.image_id));
                node.send_output(output.clone(), parameters, answer.text.into_arrow())?;
            }
            Ok(Outcome::Accepted) | Ok(Outcome::Ignored(_)) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => log::error!("Rejected event: {e}"),
        }
    }

    Ok(())
}
