// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub trait ResultExt<E> {
    type Ok;

    /// Logs the error with the caller location and `what` as context, and
    /// turns the result into an `Option`.
    fn log_err(self, what: &'static str) -> Option<Self::Ok>;
}

impl<T, E> ResultExt<E> for Result<T, E>
where
    E: std::fmt::Display,
{
    type Ok = T;

    #[track_caller]
    fn log_err(self, what: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    error = %error,
                    caller.file = %loc.file(),
                    caller.line = loc.line(),
                    caller.col  = loc.column(),
                    "{what}"
                );
                None
            }
        }
    }
}
