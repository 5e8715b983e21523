//! Critic and target critic working together

use tch::{Device, Kind, Tensor};
use torch_demos::config::CriticConfig;
use torch_demos::neural::{Critic, TdErrorClip};

fn config(clip: TdErrorClip) -> CriticConfig {
    CriticConfig { action_num: 4, frames: 4, frame_size: 84, minibatch_size: 8, clip, ..Default::default() }
}

#[test]
fn target_network_lags_until_synced() {
    let mut q_net = Critic::new("QNet", config(TdErrorClip::Unclipped)).unwrap();
    let mut target = Critic::new("Target_QNet", config(TdErrorClip::Unclipped)).unwrap();
    target.sync_from(&q_net).unwrap();

    let data = Tensor::randn([8, 4, 84, 84], (Kind::Float, Device::Cpu));
    let action = Tensor::randint(4, [8], (Kind::Int64, Device::Cpu));
    let reward = Tensor::randn([8], (Kind::Float, Device::Cpu)) * 10.0;
    q_net.train_step(&data, &action, &reward).unwrap();
    assert_ne!(q_net.param_stats(), target.param_stats());

    target.sync_from(&q_net).unwrap();
    assert_eq!(q_net.param_stats(), target.param_stats());
    let a = q_net.calc_score(&data).unwrap();
    let b = target.calc_score(&data).unwrap();
    assert!(a.allclose(&b, 1e-6, 1e-6, false));
}

#[test]
fn clipped_critic_reports_bounded_error() {
    let mut q_net = Critic::new("QNet", config(TdErrorClip::Clipped(1.0))).unwrap();
    let data = Tensor::randn([8, 4, 84, 84], (Kind::Float, Device::Cpu));
    let action = Tensor::zeros([8], (Kind::Int64, Device::Cpu));
    let reward = Tensor::full([8], 1000.0, (Kind::Float, Device::Cpu));
    let td = q_net.train_step(&data, &action, &reward).unwrap();
    assert!((td - 1.0).abs() < 1e-6);
}
