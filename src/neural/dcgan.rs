//! DCGAN generator and discriminator
//!
//! Both networks work on 64x64 images. Every convolution is bias-free and
//! initialised from N(0, 0.02).

use tch::{nn, Tensor};

const INIT_STDEV: f64 = 0.02;
const LEAK: f64 = 0.2;

fn ws_init() -> nn::Init {
    nn::Init::Randn { mean: 0.0, stdev: INIT_STDEV }
}

fn conv_t(p: nn::Path, c_in: i64, c_out: i64, stride: i64, padding: i64) -> nn::ConvTranspose2D {
    let config = nn::ConvTransposeConfig {
        stride,
        padding,
        bias: false,
        ws_init: ws_init(),
        ..Default::default()
    };
    nn::conv_transpose2d(p, c_in, c_out, 4, config)
}

fn conv(p: nn::Path, c_in: i64, c_out: i64, stride: i64, padding: i64) -> nn::Conv2D {
    let config = nn::ConvConfig {
        stride,
        padding,
        bias: false,
        ws_init: ws_init(),
        ..Default::default()
    };
    nn::conv2d(p, c_in, c_out, 4, config)
}

fn leaky_relu(xs: &Tensor) -> Tensor {
    xs.maximum(&(xs * LEAK))
}

/// Latent `(b, nz, 1, 1)` to image `(b, nc, 64, 64)` in `[-1, 1]`
pub fn generator(p: &nn::Path, nz: i64, ngf: i64, nc: i64) -> nn::SequentialT {
    nn::seq_t()
        // nz -> (ngf*8) x 4 x 4
        .add(conv_t(p / "convt1", nz, ngf * 8, 1, 0))
        .add(nn::batch_norm2d(p / "bn1", ngf * 8, Default::default()))
        .add_fn(|xs| xs.relu())
        // (ngf*4) x 8 x 8
        .add(conv_t(p / "convt2", ngf * 8, ngf * 4, 2, 1))
        .add(nn::batch_norm2d(p / "bn2", ngf * 4, Default::default()))
        .add_fn(|xs| xs.relu())
        // (ngf*2) x 16 x 16
        .add(conv_t(p / "convt3", ngf * 4, ngf * 2, 2, 1))
        .add(nn::batch_norm2d(p / "bn3", ngf * 2, Default::default()))
        .add_fn(|xs| xs.relu())
        // ngf x 32 x 32
        .add(conv_t(p / "convt4", ngf * 2, ngf, 2, 1))
        .add(nn::batch_norm2d(p / "bn4", ngf, Default::default()))
        .add_fn(|xs| xs.relu())
        // nc x 64 x 64
        .add(conv_t(p / "convt5", ngf, nc, 2, 1))
        .add_fn(|xs| xs.tanh())
}

/// Image `(b, nc, 64, 64)` to two-class logits `(b, 2, 1, 1)`
pub fn discriminator(p: &nn::Path, nc: i64, ndf: i64) -> nn::SequentialT {
    nn::seq_t()
        // ndf x 32 x 32
        .add(conv(p / "conv1", nc, ndf, 2, 1))
        .add_fn(leaky_relu)
        // (ndf*2) x 16 x 16
        .add(conv(p / "conv2", ndf, ndf * 2, 2, 1))
        .add(nn::batch_norm2d(p / "bn2", ndf * 2, Default::default()))
        .add_fn(leaky_relu)
        // (ndf*4) x 8 x 8
        .add(conv(p / "conv3", ndf * 2, ndf * 4, 2, 1))
        .add(nn::batch_norm2d(p / "bn3", ndf * 4, Default::default()))
        .add_fn(leaky_relu)
        // (ndf*8) x 4 x 4
        .add(conv(p / "conv4", ndf * 4, ndf * 8, 2, 1))
        .add(nn::batch_norm2d(p / "bn4", ndf * 8, Default::default()))
        .add_fn(leaky_relu)
        .add(conv(p / "conv5", ndf * 8, 2, 1, 0))
}
