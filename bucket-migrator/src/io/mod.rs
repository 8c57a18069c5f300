/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Content type detection for object payloads
pub mod content_type;

// re-exports
pub use self::content_type::detect_content_type;
