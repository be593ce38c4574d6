use crate::demo::{Demo, FrameTime};

pub fn update<D: Demo>(demo: &mut D, frame: FrameTime) -> anyhow::Result<()> {
    demo.stage_mut().scene.early_update();
    demo.update(frame);
    demo.stage_mut().scene.late_update();

    Ok(())
}
