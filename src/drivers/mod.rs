//! Button debouncing, software PWM and worker-thread helpers.

pub mod debounce;
pub mod soft_pwm;
pub mod task_pin;
