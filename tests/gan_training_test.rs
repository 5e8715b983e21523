//! End-to-end DCGAN run on a handful of random images

use tch::{Device, Kind, Tensor};
use torch_demos::config::DcganConfig;
use torch_demos::data::ImageDataset;
use torch_demos::training::{read_loss_log, GanTrainer};

fn tiny_config(outf: std::path::PathBuf) -> DcganConfig {
    DcganConfig {
        batch_size: 2,
        nz: 4,
        ngf: 2,
        ndf: 2,
        niter: 2,
        visual_interval: 2,
        outf,
        ..Default::default()
    }
}

fn random_pixels(n: i64, side: i64) -> Tensor {
    Tensor::randint(256, [n, 3, side, side], (Kind::Int64, Device::Cpu)).to_kind(Kind::Uint8)
}

#[test]
fn training_writes_images_checkpoints_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let outf = dir.path().join("results");

    // five images, batch of two: two iterations per epoch
    let dataset = ImageDataset::from_tensor(random_pixels(5, 64), 64).unwrap();

    let mut trainer = GanTrainer::new(tiny_config(outf.clone())).unwrap();
    let summary = trainer.train(&dataset).unwrap();
    assert_eq!(summary.epochs, 2);
    assert_eq!(summary.iterations, 4);
    assert!(summary.final_loss_d.is_finite());

    for file in [
        "config.json",
        "fake_img_iter_0.png",
        "real_img_iter_0.png",
        "fake_img_iter_2.png",
        "generator_epoch_0.params",
        "discriminator_epoch_1.params",
        "generator.params",
        "discriminator.params",
    ] {
        assert!(outf.join(file).exists(), "missing {}", file);
    }
    assert!(!outf.join("fake_img_iter_1.png").exists());

    let records = read_loss_log(outf.join("training_log.csv")).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records.last().unwrap().epoch, 1);
}

#[test]
fn resumed_trainer_starts_from_saved_weights() {
    let dir = tempfile::tempdir().unwrap();
    let outf = dir.path().join("first");
    let dataset = ImageDataset::from_tensor(random_pixels(2, 64), 64).unwrap();

    let mut first = GanTrainer::new(DcganConfig { niter: 1, check_point: false, ..tiny_config(outf.clone()) }).unwrap();
    first.train(&dataset).unwrap();
    assert!(!outf.join("generator_epoch_0.params").exists());

    let resumed = GanTrainer::new(DcganConfig {
        net_g: outf.join("generator.params").to_string_lossy().into_owned(),
        net_d: outf.join("discriminator.params").to_string_lossy().into_owned(),
        ..tiny_config(dir.path().join("second"))
    })
    .unwrap();

    let saved = first.generator_store().variables();
    for (name, tensor) in resumed.generator_store().variables() {
        assert!(tensor.allclose(&saved[&name], 1e-6, 1e-6, false), "{} differs", name);
    }
}

#[test]
fn cifar_sized_images_train_at_64() {
    let dir = tempfile::tempdir().unwrap();
    let outf = dir.path().join("small");
    let dataset = ImageDataset::from_tensor(random_pixels(4, 32), 64).unwrap();

    let mut trainer = GanTrainer::new(DcganConfig { niter: 1, ..tiny_config(outf.clone()) }).unwrap();
    let summary = trainer.train(&dataset).unwrap();
    assert_eq!(summary.iterations, 2);
    assert!(outf.join("real_img_iter_0.png").exists());
}

#[test]
fn resuming_into_same_directory_extends_the_loss_log() {
    let dir = tempfile::tempdir().unwrap();
    let outf = dir.path().join("run");
    let dataset = ImageDataset::from_tensor(random_pixels(2, 64), 64).unwrap();

    let mut first = GanTrainer::new(DcganConfig { niter: 1, ..tiny_config(outf.clone()) }).unwrap();
    first.train(&dataset).unwrap();
    assert_eq!(read_loss_log(outf.join("training_log.csv")).unwrap().len(), 1);

    let mut resumed = GanTrainer::new(DcganConfig {
        niter: 1,
        net_g: outf.join("generator.params").to_string_lossy().into_owned(),
        net_d: outf.join("discriminator.params").to_string_lossy().into_owned(),
        ..tiny_config(outf.clone())
    })
    .unwrap();
    assert!(resumed.is_resumed());
    resumed.train(&dataset).unwrap();

    let records = read_loss_log(outf.join("training_log.csv")).unwrap();
    assert_eq!(records.len(), 2);
}
