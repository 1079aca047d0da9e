// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Adam optimizer over the predictor's parameter set.

use crate::model::Params;
use crate::ModelConfig;

/// Adam with bias-corrected first and second moments.
pub(crate) struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    step: i32,
    m: Params,
    v: Params,
}

impl Adam {
    pub fn new(config: &ModelConfig, lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            step: 0,
            m: Params::zeros_like(config),
            v: Params::zeros_like(config),
        }
    }

    /// Applies one update from accumulated gradients.
    pub fn step(&mut self, params: &mut Params, grads: &Params) {
        self.step += 1;
        let bc1 = 1.0 - self.beta1.powi(self.step);
        let bc2 = 1.0 - self.beta2.powi(self.step);

        let ps = params.fields_mut();
        let gs = grads.fields();
        let ms = self.m.fields_mut();
        let vs = self.v.fields_mut();

        for (((_, p), (_, g)), ((_, m), (_, v))) in
            ps.into_iter().zip(gs).zip(ms.into_iter().zip(vs))
        {
            let p_data = p.data_mut();
            let g_data = g.data();
            let m_data = m.data_mut();
            let v_data = v.data_mut();
            for i in 0..p_data.len() {
                let grad = g_data[i];
                m_data[i] = self.beta1 * m_data[i] + (1.0 - self.beta1) * grad;
                v_data[i] = self.beta2 * v_data[i] + (1.0 - self.beta2) * grad * grad;
                let m_hat = m_data[i] / bc1;
                let v_hat = v_data[i] / bc2;
                p_data[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
            }
        }
    }
}
