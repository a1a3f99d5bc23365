//! Validated effect dispatch: catalog lookup, clamping, and the typed
//! transport call for one controller target.

use crate::catalog::{self, EffectKind};
use crate::link::{ControllerTarget, EffectTransport, LinkResult};

/// Send one effect's parameter vector to the service.
///
/// The vector is clamped against the catalog definition before anything hits
/// the wire. With no live connection the dispatch is dropped with a log line
/// and `Ok` is returned; the operator sees the link status instead of an
/// error dialog, and this never waits for a connection. An unknown effect
/// name is an error for the caller to log or ignore.
pub fn dispatch_effect(
    transport: &dyn EffectTransport,
    name: &str,
    target: ControllerTarget,
    raw: &[u8],
) -> Result<(), String> {
    let def = catalog::find(name).ok_or_else(|| format!("unknown effect: {name}"))?;
    if !transport.is_running() {
        log::debug!("{name} dispatch dropped: effect service not connected");
        return Ok(());
    }
    let vector = catalog::clamp_vector(def, raw);
    send_effect(transport, def.kind, target, &vector).map_err(|e| e.to_string())
}

/// Stop all effects for the target. Dropped with a log line when the service
/// is not connected, like a dispatch.
pub fn disable_all(transport: &dyn EffectTransport, target: ControllerTarget) -> Result<(), String> {
    if !transport.is_running() {
        log::debug!("disable dropped: effect service not connected");
        return Ok(());
    }
    transport.disable(target).map_err(|e| e.to_string())
}

// Vector lengths are guaranteed by clamp_vector, so slot indexing is safe.
fn send_effect(
    transport: &dyn EffectTransport,
    kind: EffectKind,
    target: ControllerTarget,
    v: &[u8],
) -> LinkResult {
    match kind {
        EffectKind::Feedback => transport.feedback(target, v[0], v[1]),
        EffectKind::Weapon => transport.weapon(target, v[0], v[1], v[2]),
        EffectKind::Vibration => transport.vibration(target, v[0], v[1], v[2]),
        EffectKind::SlopeFeedback => transport.slope_feedback(target, v[0], v[1], v[2], v[3]),
        EffectKind::MultiPositionFeedback => transport.multi_position_feedback(target, v),
        EffectKind::MultiPositionVibration => {
            transport.multi_position_vibration(target, v[0], &v[1..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{NullTransport, RecordingTransport, TransportOp};

    fn running_transport() -> RecordingTransport {
        let transport = RecordingTransport::new();
        transport.start();
        transport.clear();
        transport
    }

    #[test]
    fn dispatch_routes_to_the_matching_command() {
        let transport = running_transport();
        dispatch_effect(&transport, "Feedback", ControllerTarget::Left, &[3, 5]).unwrap();
        assert_eq!(
            transport.operations(),
            vec![TransportOp::Feedback {
                target: ControllerTarget::Left,
                position: 3,
                strength: 5,
            }]
        );
    }

    #[test]
    fn dispatch_clamps_before_sending() {
        let transport = running_transport();
        dispatch_effect(&transport, "Weapon", ControllerTarget::Both, &[0, 200, 4]).unwrap();
        assert_eq!(
            transport.operations(),
            vec![TransportOp::Weapon {
                target: ControllerTarget::Both,
                start_position: 2,
                end_position: 8,
                strength: 4,
            }]
        );
    }

    #[test]
    fn multi_position_vibration_splits_frequency_from_amplitudes() {
        let transport = running_transport();
        let mut raw = vec![120u8];
        raw.extend([1u8; 10]);
        dispatch_effect(&transport, "Multi-Pos Vibration", ControllerTarget::Right, &raw).unwrap();
        assert_eq!(
            transport.operations(),
            vec![TransportOp::MultiPositionVibration {
                target: ControllerTarget::Right,
                frequency: 120,
                amplitudes: vec![1; 10],
            }]
        );
    }

    #[test]
    fn unknown_effect_is_an_error() {
        let transport = running_transport();
        assert!(dispatch_effect(&transport, "Rumble", ControllerTarget::Both, &[]).is_err());
        assert!(transport.operations().is_empty());
    }

    #[test]
    fn dispatch_without_connection_drops_silently() {
        let transport = RecordingTransport::new();
        dispatch_effect(&transport, "Feedback", ControllerTarget::Both, &[1, 1]).unwrap();
        disable_all(&transport, ControllerTarget::Both).unwrap();
        assert!(transport.operations().is_empty());
    }

    #[test]
    fn disable_reaches_a_running_transport() {
        let transport = running_transport();
        disable_all(&transport, ControllerTarget::Both).unwrap();
        assert_eq!(
            transport.operations(),
            vec![TransportOp::Disable {
                target: ControllerTarget::Both
            }]
        );
    }

    #[test]
    fn null_transport_accepts_everything() {
        dispatch_effect(&NullTransport, "Slope Feedback", ControllerTarget::Both, &[1, 2, 3, 4])
            .unwrap();
        disable_all(&NullTransport, ControllerTarget::Left).unwrap();
    }
}
