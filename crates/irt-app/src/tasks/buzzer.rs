//! Audible cues on the piezo buzzer, one PWM channel.

use embassy_nrf::pwm::SimplePwm;
use embassy_time::{Duration, Timer};

/// PWM counter clock after the Div16 prescaler.
const PWM_CLOCK_HZ: u32 = 1_000_000;
const TONE_F5_HZ: u32 = 698;
const TONE_A5_HZ: u32 = 880;
const TONE_LEN: Duration = Duration::from_millis(100);

pub struct Buzzer {
    pwm: SimplePwm<'static>,
}

impl Buzzer {
    pub fn new(pwm: SimplePwm<'static>) -> Self {
        let mut buzzer = Self { pwm };
        buzzer.silence();
        buzzer
    }

    async fn tone(&mut self, freq_hz: u32, length: Duration) {
        let top = (PWM_CLOCK_HZ / freq_hz) as u16;
        self.pwm.set_max_duty(top);
        // 50% duty square wave.
        self.pwm.set_duty(0, top / 2);
        Timer::after(length).await;
    }

    fn silence(&mut self) {
        self.pwm.set_duty(0, 0);
    }

    /// Rising two-note cue when an acquisition starts.
    pub async fn start_cue(&mut self) {
        self.tone(TONE_F5_HZ, TONE_LEN).await;
        self.tone(TONE_A5_HZ, TONE_LEN).await;
        self.silence();
    }

    /// Three falling note pairs when the result is ready.
    pub async fn end_cue(&mut self) {
        for _ in 0..3 {
            self.tone(TONE_A5_HZ, TONE_LEN).await;
            self.tone(TONE_F5_HZ, TONE_LEN).await;
        }
        self.silence();
    }
}
