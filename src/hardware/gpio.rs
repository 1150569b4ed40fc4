//! Raspberry Pi devices on top of `rppal`.
//!
//! Only compiled with the `gpio` feature so the crate still builds (and runs
//! in `--simulate` mode) on machines without `/dev/gpiomem`.

use super::traits::{LidActuator, PresenceSensor};
use super::{servo_pulse_width, Hardware, SERVO_PERIOD};
use crate::config::ControllerConfig;
use crate::error::{BinError, Result};
use crate::sensing::{EchoPins, LidState, Ultrasonic};
use rppal::gpio::{Gpio, InputPin, OutputPin};

/// Trigger and echo lines of an HC-SR04.
pub struct RppalEchoPins {
    trigger: OutputPin,
    echo: InputPin,
}

impl EchoPins for RppalEchoPins {
    fn set_trigger(&mut self, high: bool) {
        if high {
            self.trigger.set_high();
        } else {
            self.trigger.set_low();
        }
    }

    fn echo_is_high(&self) -> bool {
        self.echo.is_high()
    }
}

/// Active-high infrared proximity sensor.
pub struct IrPresenceSensor {
    pin: InputPin,
}

impl PresenceSensor for IrPresenceSensor {
    fn is_present(&mut self) -> Result<bool> {
        Ok(self.pin.is_high())
    }
}

/// Hobby servo driven with software PWM.
pub struct ServoLid {
    pin: Option<OutputPin>,
    open_angle: f64,
    closed_angle: f64,
    last: Option<LidState>,
}

impl ServoLid {
    fn angle_for(&self, state: LidState) -> f64 {
        match state {
            LidState::Open => self.open_angle,
            LidState::Closed => self.closed_angle,
        }
    }
}

impl LidActuator for ServoLid {
    fn set_lid(&mut self, state: LidState) -> Result<()> {
        if self.last == Some(state) {
            return Ok(());
        }
        let pulse = servo_pulse_width(self.angle_for(state));
        let pin = self
            .pin
            .as_mut()
            .ok_or_else(|| BinError::device_error("servo already released"))?;
        pin.set_pwm(SERVO_PERIOD, pulse)
            .map_err(|e| BinError::device_error(format!("Failed to drive servo: {}", e)))?;
        self.last = Some(state);
        Ok(())
    }

    fn last_commanded(&self) -> Option<LidState> {
        self.last
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut pin) = self.pin.take() {
            pin.clear_pwm()
                .map_err(|e| BinError::device_error(format!("Failed to stop servo PWM: {}", e)))?;
            pin.set_low();
        }
        Ok(())
    }
}

impl Drop for ServoLid {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Servo release on drop failed: {}", e);
        }
    }
}

/// Claim every pin the controller needs.
///
/// Pins reset to their previous mode when dropped, so the handles returned here
/// give the GPIO back on every exit path.
pub fn acquire(config: &ControllerConfig) -> Result<Hardware> {
    let gpio = Gpio::new()
        .map_err(|e| BinError::hardware_error(format!("Failed to initialize GPIO: {}", e)))?;

    let claim = |pin: u8, role: &str| {
        gpio.get(pin).map_err(|e| {
            BinError::hardware_error(format!("Failed to claim {} pin {}: {}", role, pin, e))
        })
    };

    let pins = config.pins;
    let echo_pins = RppalEchoPins {
        trigger: claim(pins.trigger, "trigger")?.into_output_low(),
        echo: claim(pins.echo, "echo")?.into_input(),
    };
    let presence = IrPresenceSensor {
        pin: claim(pins.presence, "presence")?.into_input(),
    };
    let servo = ServoLid {
        pin: Some(claim(pins.servo, "servo")?.into_output_low()),
        open_angle: config.lid.open_angle,
        closed_angle: config.lid.closed_angle,
        last: None,
    };

    tracing::info!(
        "GPIO acquired: trigger={} echo={} presence={} servo={}",
        pins.trigger,
        pins.echo,
        pins.presence,
        pins.servo
    );

    Ok(Hardware {
        range: Box::new(Ultrasonic::new(
            echo_pins,
            config.sensor.echo_timeout(),
            config.sensor.speed_of_sound_cm_s,
        )),
        presence: Box::new(presence),
        lid: Box::new(servo),
    })
}
