//! Drives every loaded fader from a single tick source.

use serde::Serialize;

use crate::fader::{Evaluation, FaderController, Regime};

/// Snapshot of one evaluation, tagged with the fader that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaderReport {
    pub fader: String,
    pub temperature: f32,
    pub pwm: f32,
    pub regime: Regime,
    pub next_poll: u16,
    pub written: bool,
    pub switch_on: bool,
}

impl FaderReport {
    fn new(fader: &FaderController, eval: Evaluation) -> Self {
        Self {
            fader: fader.name().to_string(),
            temperature: eval.temperature,
            pwm: eval.pwm,
            regime: eval.regime,
            next_poll: eval.next_poll,
            written: eval.written,
            switch_on: eval.switch_on,
        }
    }
}

/// Owns the fader instances and ticks them in load order.
#[derive(Debug, Default)]
pub struct TickDispatcher {
    faders: Vec<FaderController>,
}

impl TickDispatcher {
    pub fn new(faders: Vec<FaderController>) -> Self {
        Self { faders }
    }

    pub fn len(&self) -> usize {
        self.faders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faders.is_empty()
    }

    pub fn faders(&self) -> &[FaderController] {
        &self.faders
    }

    /// Delivers one tick to every fader and collects the ones that sampled.
    pub fn tick(&mut self) -> Vec<FaderReport> {
        self.faders
            .iter_mut()
            .filter_map(|fader| fader.on_tick().map(|eval| FaderReport::new(fader, eval)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        drivers::virtual_switch::VirtualSwitch,
        fader::FaderSettings,
        sensors::{SensorHandle, SensorPool, SensorSource},
        switches::{Actuator, SwitchHandle, SwitchPool},
        temperature_sensors::fixed::FixedSensor,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn dispatcher() -> TickDispatcher {
        let sensors: Arc<dyn SensorSource> = Arc::new(SensorPool::new(vec![
            Box::new(FixedSensor::new("hotend", 'T', 100.0)),
            Box::new(FixedSensor::new("bed", 'B', 20.0)),
        ]));
        let actuator: Arc<dyn Actuator> = Arc::new(SwitchPool::new(vec![
            Box::new(VirtualSwitch::new("fan")),
            Box::new(VirtualSwitch::new("light")),
        ]));

        let fast = FaderController::new(
            "hotend",
            vec![SensorHandle(0)],
            SwitchHandle::new("fan"),
            FaderSettings { heatup_poll: 2, ..Default::default() },
            sensors.clone(),
            actuator.clone(),
        )
        .unwrap();
        let slow = FaderController::new(
            "bed",
            vec![SensorHandle(1)],
            SwitchHandle::new("light"),
            FaderSettings { heatup_poll: 3, ..Default::default() },
            sensors,
            actuator,
        )
        .unwrap();

        TickDispatcher::new(vec![fast, slow])
    }

    #[test]
    fn each_fader_keeps_its_own_cadence() {
        let mut dispatcher = dispatcher();
        assert_eq!(dispatcher.len(), 2);

        assert!(dispatcher.tick().is_empty());

        let second = dispatcher.tick();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].fader, "hotend");
        assert_eq!(second[0].pwm, 127.0);
        assert_eq!(second[0].regime, Regime::Fading);

        let third = dispatcher.tick();
        let names: Vec<_> = third.iter().map(|r| r.fader.as_str()).collect();
        assert_eq!(names, vec!["hotend", "bed"]);
        assert!(!third[0].written, "same value is not rewritten");
        assert_eq!(third[1].regime, Regime::Heatup);
    }

    #[test]
    fn empty_dispatcher_ticks_quietly() {
        let mut dispatcher = TickDispatcher::default();
        assert!(dispatcher.is_empty());
        assert!(dispatcher.tick().is_empty());
    }
}
