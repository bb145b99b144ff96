//! Constant-velocity Kalman filter over bounding boxes.
//!
//! State vector:
//! ```text
//! [cx, cy, w, h, vx, vy, vw, vh]
//!  ^center  ^size  ^velocities
//! ```
//! The covariance is kept as a diagonal approximation, which is accurate
//! enough for frame-to-frame box smoothing and keeps the update O(1).

use vigil_models::BBox;

/// Noise parameters for the filter.
#[derive(Debug, Clone)]
pub struct KalmanParams {
    /// Process noise added to position/size covariance per step
    pub process_noise_pos: f32,
    /// Process noise added to velocity covariance per step
    pub process_noise_vel: f32,
    /// Measurement noise of the detector boxes
    pub measurement_noise: f32,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            process_noise_pos: 1.0,
            process_noise_vel: 0.1,
            measurement_noise: 1.0,
        }
    }
}

/// Kalman filter state for one tracked box.
#[derive(Debug, Clone)]
pub struct KalmanBox {
    /// State: [cx, cy, w, h, vx, vy, vw, vh]
    state: [f32; 8],
    /// Covariance diagonal
    covariance: [f32; 8],
}

impl KalmanBox {
    /// Initialize from a first observation with zero velocity.
    pub fn new(bbox: &BBox) -> Self {
        let (cx, cy) = bbox.center();
        Self {
            state: [cx, cy, bbox.width, bbox.height, 0.0, 0.0, 0.0, 0.0],
            covariance: [10.0, 10.0, 10.0, 10.0, 100.0, 100.0, 100.0, 100.0],
        }
    }

    /// Advance one step with the constant-velocity model and return the
    /// predicted box.
    pub fn predict(&mut self, params: &KalmanParams) -> BBox {
        self.state[0] += self.state[4];
        self.state[1] += self.state[5];
        self.state[2] += self.state[6];
        self.state[3] += self.state[7];

        // Sizes must stay positive
        self.state[2] = self.state[2].max(1.0);
        self.state[3] = self.state[3].max(1.0);

        for i in 0..4 {
            self.covariance[i] += params.process_noise_pos;
        }
        for i in 4..8 {
            self.covariance[i] += params.process_noise_vel;
        }

        self.bbox()
    }

    /// Absorb a measurement (detection box).
    pub fn update(&mut self, bbox: &BBox, params: &KalmanParams) {
        let (cx, cy) = bbox.center();
        let measurement = [cx, cy, bbox.width, bbox.height];

        for i in 0..4 {
            let innovation_var = self.covariance[i] + params.measurement_noise;
            let gain = self.covariance[i] / innovation_var;
            let innovation = measurement[i] - self.state[i];
            self.state[i] += gain * innovation;
            self.state[i + 4] = gain * innovation;
            self.covariance[i] *= 1.0 - gain;
        }

        self.state[2] = self.state[2].max(1.0);
        self.state[3] = self.state[3].max(1.0);
    }

    /// Current box estimate.
    pub fn bbox(&self) -> BBox {
        let [cx, cy, w, h, ..] = self.state;
        let w = w.max(1.0);
        let h = h.max(1.0);
        BBox::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_keeps_box() {
        let b = BBox::new(100.0, 100.0, 50.0, 60.0);
        let k = KalmanBox::new(&b);
        let out = k.bbox();
        assert!((out.x - 100.0).abs() < 1e-4);
        assert!((out.width - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_predict_follows_velocity() {
        let params = KalmanParams::default();
        let mut k = KalmanBox::new(&BBox::new(100.0, 100.0, 50.0, 60.0));

        // One update moving right establishes a velocity estimate
        k.update(&BBox::new(110.0, 100.0, 50.0, 60.0), &params);
        let predicted = k.predict(&params);
        assert!(predicted.x > 100.0);
    }

    #[test]
    fn test_dimensions_stay_positive() {
        let params = KalmanParams::default();
        let mut k = KalmanBox::new(&BBox::new(0.0, 0.0, 2.0, 2.0));
        for _ in 0..100 {
            k.update(&BBox::new(0.0, 0.0, 1.0, 1.0), &params);
            k.predict(&params);
        }
        let b = k.bbox();
        assert!(b.width >= 1.0);
        assert!(b.height >= 1.0);
    }
}
